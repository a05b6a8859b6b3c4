use std::fs;

use tempfile::tempdir;

use super::*;

const TAG_CACHE: &str = "\
info_begin
mpd_version: 0.15.0
fs_charset: UTF-8
info_end
songList begin
key: song1.mp3
file: song1.mp3
Time: 4
Artist: Sunny Day
Title: Uno
Album: First
Track: 1/3
key: song2.mp3
file: song2.mp3
Time: 126
Artist: Rainy Day
Title: Dos
Album: First
Track: 2
songList end
directory: albums
mtime: 1
begin: albums
songList begin
key: deep.mp3
file: albums/deep.mp3
Time: 30
Title: Deep Cut
songList end
end: albums
";

struct Fixture {
    library: Library,
    root: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let root = tempdir().unwrap();
    let cache_path = root.path().join("tag_cache");
    fs::write(&cache_path, TAG_CACHE).unwrap();
    let library = Library::open(&cache_path, root.path()).unwrap();
    Fixture { library, root }
}

fn uri_of(fx: &Fixture, rel: &str) -> String {
    url::Url::from_file_path(fx.root.path().join(rel))
        .unwrap()
        .to_string()
}

#[test]
fn open_indexes_all_songs() {
    let fx = fixture();
    assert_eq!(fx.library.len(), 3);
}

#[test]
fn lookup_returns_full_metadata() {
    let fx = fixture();
    let track = fx.library.lookup(&uri_of(&fx, "song1.mp3")).unwrap();
    assert_eq!(track.name.as_deref(), Some("Uno"));
    assert_eq!(track.artists, vec!["Sunny Day".to_string()]);
    assert_eq!(track.album.as_deref(), Some("First"));
    assert_eq!(track.length_ms, Some(4000));
    assert_eq!(track.track_no, Some(1));
}

#[test]
fn lookup_unknown_uri_is_not_found() {
    let fx = fixture();
    assert!(matches!(
        fx.library.lookup("file:///nope.mp3"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn search_matches_title_artist_album_case_insensitively() {
    let fx = fixture();

    let by_title = fx.library.search("uno");
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].name.as_deref(), Some("Uno"));

    let by_artist = fx.library.search("RAINY");
    assert_eq!(by_artist.len(), 1);
    assert_eq!(by_artist[0].name.as_deref(), Some("Dos"));

    let by_album = fx.library.search("first");
    assert_eq!(by_album.len(), 2);

    assert!(fx.library.search("no such thing").is_empty());
    assert!(fx.library.search("   ").is_empty());
}

#[test]
fn browse_root_lists_directories_then_tracks() {
    let fx = fixture();
    let entries = fx.library.browse("").unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], BrowseEntry::Directory("albums".to_string()));
    match (&entries[1], &entries[2]) {
        (BrowseEntry::Track(a), BrowseEntry::Track(b)) => {
            assert_eq!(a.name.as_deref(), Some("Uno"));
            assert_eq!(b.name.as_deref(), Some("Dos"));
        }
        other => panic!("expected two tracks, got {other:?}"),
    }
}

#[test]
fn browse_subdirectory_lists_its_tracks() {
    let fx = fixture();
    let entries = fx.library.browse("albums").unwrap();
    assert_eq!(entries.len(), 1);
    match &entries[0] {
        BrowseEntry::Track(t) => assert_eq!(t.name.as_deref(), Some("Deep Cut")),
        other => panic!("expected a track, got {other:?}"),
    }
    // Trailing slash tolerated.
    assert_eq!(fx.library.browse("albums/").unwrap().len(), 1);
}

#[test]
fn browse_unknown_directory_is_not_found() {
    let fx = fixture();
    assert!(matches!(
        fx.library.browse("basement"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn missing_cache_file_is_fatal() {
    let root = tempdir().unwrap();
    let err = Library::open(&root.path().join("absent"), root.path()).unwrap_err();
    assert!(matches!(err, Error::TagCache { .. }));
}

#[test]
fn malformed_cache_is_fatal_not_empty() {
    let root = tempdir().unwrap();
    let cache_path = root.path().join("tag_cache");
    fs::write(&cache_path, "this is not a tag cache\n").unwrap();
    let err = Library::open(&cache_path, root.path()).unwrap_err();
    assert!(matches!(err, Error::TagCache { .. }));
}

#[test]
fn truncated_song_list_is_fatal() {
    let root = tempdir().unwrap();
    let cache_path = root.path().join("tag_cache");
    fs::write(
        &cache_path,
        "info_begin\nmpd_version: 0.15.0\ninfo_end\nsongList begin\nkey: a.mp3\nfile: a.mp3\n",
    )
    .unwrap();
    let err = Library::open(&cache_path, root.path()).unwrap_err();
    assert!(matches!(err, Error::TagCache { .. }));
}

#[test]
fn header_only_cache_yields_an_explicit_empty_index() {
    let root = tempdir().unwrap();
    let cache_path = root.path().join("tag_cache");
    fs::write(
        &cache_path,
        "info_begin\nmpd_version: 0.15.0\nfs_charset: UTF-8\ninfo_end\n",
    )
    .unwrap();
    let library = Library::open(&cache_path, root.path()).unwrap();
    assert!(library.is_empty());
    assert!(library.browse("").unwrap().is_empty());
}

#[test]
fn song_without_file_field_falls_back_to_key_within_directory() {
    let root = tempdir().unwrap();
    let cache_path = root.path().join("tag_cache");
    fs::write(
        &cache_path,
        "info_begin\nmpd_version: 0.15.0\ninfo_end\n\
         begin: sub\nsongList begin\nkey: tune.mp3\nTitle: Tune\nsongList end\nend: sub\n",
    )
    .unwrap();
    let library = Library::open(&cache_path, root.path()).unwrap();
    let track = library
        .lookup(
            &url::Url::from_file_path(root.path().join("sub/tune.mp3"))
                .unwrap()
                .to_string(),
        )
        .unwrap();
    assert_eq!(track.name.as_deref(), Some("Tune"));
}
