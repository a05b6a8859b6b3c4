//! Parser for the MPD-style tag-cache artifact.
//!
//! The cache is a line-oriented text format: an `info_begin`/`info_end`
//! header, `songList begin`/`songList end` blocks of `key:`-delimited song
//! records, and nested `directory:`/`begin:`/`end:` blocks for hierarchy.
//! `file:` values are paths relative to the music root. The format is
//! owned by the scanner that produces the file; this parser only consumes
//! it, strictly: structural damage is an error, unknown fields are not.

use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub(crate) struct ParsedSong {
    /// `/`-separated path relative to the music root.
    pub(crate) path: String,
    pub(crate) title: Option<String>,
    pub(crate) artist: Option<String>,
    pub(crate) album: Option<String>,
    pub(crate) time_s: Option<u64>,
    pub(crate) track_no: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct ParsedCache {
    pub(crate) directories: Vec<String>,
    pub(crate) songs: Vec<ParsedSong>,
}

#[derive(Debug, Default)]
struct PendingSong {
    key: String,
    file: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    time_s: Option<u64>,
    track_no: Option<u32>,
}

pub(crate) fn parse(contents: &str) -> Result<ParsedCache, String> {
    let mut lines = contents.lines().enumerate();

    // Header: everything up to info_end is version/charset metadata we do
    // not act on, but a file without the header is not a tag cache.
    match lines.next() {
        Some((_, line)) if line.trim() == "info_begin" => {}
        _ => return Err("missing info_begin header".to_string()),
    }
    let mut header_closed = false;
    for (n, line) in lines.by_ref() {
        if line.trim() == "info_end" {
            header_closed = true;
            break;
        }
        if split_field(line).is_none() {
            return Err(format!("line {}: malformed header line {line:?}", n + 1));
        }
    }
    if !header_closed {
        return Err("unterminated info header".to_string());
    }

    let mut directories = BTreeSet::new();
    let mut songs = Vec::new();
    let mut dir_stack: Vec<String> = Vec::new();
    let mut in_songs = false;
    let mut pending: Option<PendingSong> = None;

    for (n, raw) in lines {
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        let lineno = n + 1;

        match line {
            "songList begin" => {
                if in_songs {
                    return Err(format!("line {lineno}: nested songList"));
                }
                in_songs = true;
                continue;
            }
            "songList end" => {
                if !in_songs {
                    return Err(format!("line {lineno}: songList end without begin"));
                }
                flush(&mut pending, &dir_stack, &mut songs, lineno)?;
                in_songs = false;
                continue;
            }
            _ => {}
        }

        let Some((field, value)) = split_field(line) else {
            return Err(format!("line {lineno}: unexpected line {line:?}"));
        };

        if in_songs {
            match field {
                "key" => {
                    flush(&mut pending, &dir_stack, &mut songs, lineno)?;
                    pending = Some(PendingSong {
                        key: value.to_string(),
                        ..PendingSong::default()
                    });
                }
                _ => {
                    let Some(song) = pending.as_mut() else {
                        return Err(format!("line {lineno}: song field before key"));
                    };
                    match field {
                        "file" => song.file = Some(value.to_string()),
                        "Title" => song.title = Some(value.to_string()),
                        "Artist" => song.artist = Some(value.to_string()),
                        "Album" => song.album = Some(value.to_string()),
                        "Time" => {
                            song.time_s = Some(value.parse().map_err(|_| {
                                format!("line {lineno}: bad Time value {value:?}")
                            })?)
                        }
                        "Track" => {
                            let number = value.split('/').next().unwrap_or(value);
                            song.track_no = Some(number.trim().parse().map_err(|_| {
                                format!("line {lineno}: bad Track value {value:?}")
                            })?)
                        }
                        // mtime, Date, Genre and friends: carried by the
                        // cache, irrelevant to the index.
                        _ => {}
                    }
                }
            }
        } else {
            match field {
                "directory" => {
                    directories.insert(join_dir(&dir_stack, value));
                }
                "begin" => {
                    directories.insert(value.to_string());
                    dir_stack.push(value.to_string());
                }
                "end" => match dir_stack.pop() {
                    Some(open) if open == value => {}
                    Some(open) => {
                        return Err(format!(
                            "line {lineno}: end {value:?} closes block {open:?}"
                        ));
                    }
                    None => return Err(format!("line {lineno}: end without begin")),
                },
                "mtime" => {}
                _ => {
                    return Err(format!(
                        "line {lineno}: unexpected field {field:?} outside songList"
                    ));
                }
            }
        }
    }

    if in_songs {
        return Err("unterminated songList".to_string());
    }
    if let Some(open) = dir_stack.last() {
        return Err(format!("unterminated directory block {open:?}"));
    }

    Ok(ParsedCache {
        directories: directories.into_iter().collect(),
        songs,
    })
}

fn flush(
    pending: &mut Option<PendingSong>,
    dir_stack: &[String],
    songs: &mut Vec<ParsedSong>,
    lineno: usize,
) -> Result<(), String> {
    let Some(song) = pending.take() else {
        return Ok(());
    };
    let path = match song.file {
        Some(file) => file,
        None if !song.key.is_empty() => join_dir(dir_stack, &song.key),
        None => return Err(format!("line {lineno}: song record without file or key")),
    };
    songs.push(ParsedSong {
        path,
        title: song.title,
        artist: song.artist,
        album: song.album,
        time_s: song.time_s,
        track_no: song.track_no,
    });
    Ok(())
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let (field, value) = line.split_once(':')?;
    let field = field.trim();
    if field.is_empty() || field.contains(' ') {
        return None;
    }
    Some((field, value.trim_start()))
}

fn join_dir(stack: &[String], name: &str) -> String {
    match stack.last() {
        Some(parent) => format!("{parent}/{name}"),
        None => name.to_string(),
    }
}
