use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use named_types::diagnostics::Diagnostics;

/// Read a config file, replacing every `include "<path>";` with the
/// (recursively inlined) contents of the file it names.
///
/// Missing, unreadable, and circular includes are replaced with
/// nothing and reported as warnings.  Only the top-level file being
/// unreadable is an error.
pub fn resolve(file_path: &Path, root_dir: &Path) -> io::Result<(String, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let text = resolve_includes(file_path, root_dir, &mut diagnostics)?;
    Ok((text, diagnostics))
}

/// Like `resolve`, but recording diagnostics into an existing
/// collector.
pub fn resolve_includes(
    file_path: &Path,
    root_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> io::Result<String> {
    let canonical = fs::canonicalize(file_path)?;
    let data = fs::read_to_string(&canonical)?;

    let mut inliner = Inliner {
        root_dir,
        expanding: HashSet::from([canonical.clone()]),
        diagnostics,
    };
    Ok(inliner.inline(&data, parent_dir(&canonical)))
}

struct Inliner<'a> {
    root_dir: &'a Path,
    /// Canonical paths of the files currently being expanded, from the
    /// top-level file down to the current one.
    expanding: HashSet<PathBuf>,
    diagnostics: &'a mut Diagnostics,
}

impl Inliner<'_> {
    fn inline(&mut self, data: &str, base_dir: &Path) -> String {
        let mut out = String::with_capacity(data.len());
        let mut last = 0;

        for site in find_includes(data) {
            out.push_str(&data[last..site.start]);
            out.push_str(&self.expand(&site.path, base_dir));
            last = site.end;
        }
        out.push_str(&data[last..]);

        out
    }

    fn expand(&mut self, include_path: &str, base_dir: &Path) -> String {
        let Some(found) = locate(include_path, base_dir, self.root_dir) else {
            self.diagnostics
                .warn(format!("Include file not found: {include_path}"));
            return String::new();
        };

        let canonical = match fs::canonicalize(&found) {
            Ok(canonical) => canonical,
            Err(error) => {
                self.diagnostics
                    .warn(format!("Include file unreadable: {include_path} ({error})"));
                return String::new();
            }
        };

        if self.expanding.contains(&canonical) {
            self.diagnostics
                .warn(format!("Circular include skipped: {include_path}"));
            return String::new();
        }

        let data = match fs::read_to_string(&canonical) {
            Ok(data) => data,
            Err(error) => {
                self.diagnostics
                    .warn(format!("Include file unreadable: {include_path} ({error})"));
                return String::new();
            }
        };

        tracing::debug!(include = %include_path, path = ?canonical, "inlining include");
        self.diagnostics
            .info(format!("Resolved include: {include_path}"));

        self.expanding.insert(canonical.clone());
        let mut inlined = self.inline(&data, parent_dir(&canonical));
        self.expanding.remove(&canonical);

        if !inlined.ends_with('\n') {
            inlined.push('\n');
        }
        inlined
    }
}

/// Find the file an include refers to.  In order:
///
/// 1. relative to the including file's directory (or as-is, if absolute)
/// 2. if absolute, its basename in the including file's directory
/// 3. ever-longer trailing segments of it, relative to `root_dir`
/// 4. any file under `root_dir` with the same basename
fn locate(include_path: &str, base_dir: &Path, root_dir: &Path) -> Option<PathBuf> {
    let path = Path::new(include_path);

    let candidate = base_dir.join(path);
    if candidate.is_file() {
        return Some(candidate);
    }

    let basename = path.file_name()?;

    if path.is_absolute() {
        let candidate = base_dir.join(basename);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let segments: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment),
            _ => None,
        })
        .collect();
    for n in 1..=segments.len() {
        let candidate = segments[segments.len() - n..]
            .iter()
            .fold(root_dir.to_path_buf(), |acc, segment| acc.join(segment));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    WalkDir::new(root_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == basename)
        .map(walkdir::DirEntry::into_path)
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// An `include "<path>";` directive in some text: `start..end` is the
/// byte range of the whole directive.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IncludeSite {
    start: usize,
    end: usize,
    path: String,
}

/// Find all the include directives in some text, skipping over
/// comments and quoted strings.  The keyword is matched
/// case-insensitively.
fn find_includes(data: &str) -> Vec<IncludeSite> {
    let bytes = data.as_bytes();
    let mut sites = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let at_word_start = i == 0 || !is_word_byte(bytes[i - 1]);
        match bytes[i] {
            b'#' => i = skip_line(bytes, i),
            b'/' if at_word_start && bytes.get(i + 1) == Some(&b'/') => i = skip_line(bytes, i),
            b'/' if at_word_start && bytes.get(i + 1) == Some(&b'*') => {
                i = find_from(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2);
            }
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'i' | b'I' if at_word_start => match include_at(data, i) {
                Some(site) => {
                    i = site.end;
                    sites.push(site);
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    sites
}

/// ```text
/// include <ws>+ <quote> <path> <quote> <ws>* ;
/// ```
fn include_at(data: &str, start: usize) -> Option<IncludeSite> {
    let bytes = data.as_bytes();
    if !bytes.get(start..start + 7)?.eq_ignore_ascii_case(b"include") {
        return None;
    }

    let mut i = skip_whitespace(bytes, start + 7);
    if i == start + 7 {
        return None;
    }

    if !matches!(bytes.get(i), Some(b'"' | b'\'')) {
        return None;
    }
    let path_start = i + 1;
    i = path_start;
    while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\'' {
        i += 1;
    }
    if i == path_start || i >= bytes.len() {
        return None;
    }
    let path = &data[path_start..i];

    i = skip_whitespace(bytes, i + 1);
    if bytes.get(i) != Some(&b';') {
        return None;
    }

    Some(IncludeSite {
        start,
        end: i + 1,
        path: path.to_string(),
    })
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'/' | b':' | b'-' | b'!')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_line(bytes: &[u8], i: usize) -> usize {
    find_from(bytes, i, b"\n").map_or(bytes.len(), |end| end + 1)
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
        } else if bytes[i] == quote {
            return i + 1;
        } else {
            i += 1;
        }
    }
    bytes.len()
}

fn find_from(bytes: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(start..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| start + offset)
}
