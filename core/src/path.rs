//! Route path patterns: validation, normalization and decomposition
//!
//! A pattern is literal bytes plus `:name` (one segment) and a trailing `*`
//! (rest of the path). Parameter names are metadata only: the tree key of
//! `/users/:id/posts` is `/users/:/posts`, so every route with a parameter at
//! the same position shares one parameter node.

use memchr::{memchr, memchr2};

use crate::error::RouterError;

/// Name under which a trailing wildcard value is exposed
pub const WILDCARD_NAME: &str = "*";

/// One tree insertion derived from a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Step {
    /// Length of the key prefix to insert
    pub key_len: usize,
    /// How many leading parameter names belong to the node
    pub names: usize,
    /// Whether the route handler is attached here
    pub terminal: bool,
}

/// A validated, normalized route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    /// Normalized path, parameter names included
    pub path: String,
    /// Tree key: the path with parameter names erased
    pub key: String,
    /// Parameter names in positional order
    pub names: Vec<String>,
    /// Insertions, structural ones first, the terminal one last
    pub steps: Vec<Step>,
    /// `<static>` key answering with a trailing-slash redirect for `<static>/*`
    pub redirect_key: Option<String>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, RouterError> {
        if raw.is_empty() {
            return Err(RouterError::EmptyPath);
        }

        let mut path = clean_path(raw);
        if raw.ends_with('/') && path != "/" {
            path.push('/');
        }
        if !path.starts_with('/') {
            return Err(RouterError::MissingLeadingSlash(raw.to_string()));
        }
        validate(&path)?;

        let bytes = path.as_bytes();
        let len = bytes.len();
        let mut key = String::with_capacity(len);
        let mut names: Vec<String> = Vec::new();
        let mut steps = Vec::new();
        let mut redirect_key = None;
        let mut i = 0;

        while i < len {
            let Some(offset) = memchr2(b':', b'*', &bytes[i..]) else {
                key.push_str(&path[i..]);
                break;
            };
            let marker = i + offset;
            key.push_str(&path[i..marker]);
            steps.push(Step {
                key_len: key.len(),
                names: 0,
                terminal: false,
            });

            if bytes[marker] == b'*' {
                if names.is_empty() && key.len() > 1 && key.ends_with('/') {
                    redirect_key = Some(key[..key.len() - 1].to_string());
                }
                names.push(WILDCARD_NAME.to_string());
                key.push('*');
                steps.push(Step {
                    key_len: key.len(),
                    names: names.len(),
                    terminal: true,
                });
                return Ok(Self {
                    path,
                    key,
                    names,
                    steps,
                    redirect_key,
                });
            }

            let end = memchr(b'/', &bytes[marker + 1..]).map_or(len, |p| marker + 1 + p);
            let name = &path[marker + 1..end];
            if names.iter().any(|n| n == name) {
                return Err(RouterError::DuplicateParamName {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
            names.push(name.to_string());
            key.push(':');
            if end == len {
                steps.push(Step {
                    key_len: key.len(),
                    names: names.len(),
                    terminal: true,
                });
                return Ok(Self {
                    path,
                    key,
                    names,
                    steps,
                    redirect_key,
                });
            }
            steps.push(Step {
                key_len: key.len(),
                names: names.len(),
                terminal: false,
            });
            i = end;
        }

        steps.push(Step {
            key_len: key.len(),
            names: names.len(),
            terminal: true,
        });
        Ok(Self {
            path,
            key,
            names,
            steps,
            redirect_key,
        })
    }
}

fn validate(path: &str) -> Result<(), RouterError> {
    if path.split('/').any(|segment| segment.matches(':').count() > 1) {
        return Err(RouterError::MultipleParamsInSegment(path.to_string()));
    }

    let wildcards = path.matches('*').count();
    if wildcards > 1 {
        return Err(RouterError::MultipleWildcards(path.to_string()));
    }
    if wildcards == 1 {
        if !path.ends_with('*') {
            return Err(RouterError::WildcardNotLast(path.to_string()));
        }
        let last = path.rfind('/').map_or(path, |i| &path[i..]);
        if last.contains(':') {
            return Err(RouterError::ParamBesideWildcard(path.to_string()));
        }
    }
    Ok(())
}

/// Lexically clean a slash-separated path
///
/// Collapses repeated separators, drops `.` elements and resolves `..`
/// elements against the preceding element. `..` never climbs above the root
/// of a rooted path. The result has no trailing separator unless it is `/`;
/// an empty unrooted result is `.`.
pub fn clean_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let len = bytes.len();
    let rooted = bytes.first() == Some(&b'/');

    let mut out: Vec<u8> = Vec::with_capacity(len);
    let mut r = 0;
    let mut dotdot = 0;
    if rooted {
        out.push(b'/');
        r = 1;
        dotdot = 1;
    }

    while r < len {
        let at_end = |i: usize| i == len || bytes[i] == b'/';
        if bytes[r] == b'/' {
            r += 1;
        } else if bytes[r] == b'.' && at_end(r + 1) {
            r += 1;
        } else if bytes[r] == b'.' && r + 1 < len && bytes[r + 1] == b'.' && at_end(r + 2) {
            r += 2;
            if out.len() > dotdot {
                let mut w = out.len() - 1;
                while w > dotdot && out[w] != b'/' {
                    w -= 1;
                }
                out.truncate(w);
            } else if !rooted {
                if !out.is_empty() {
                    out.push(b'/');
                }
                out.extend_from_slice(b"..");
                dotdot = out.len();
            }
        } else {
            if (rooted && out.len() != 1) || (!rooted && !out.is_empty()) {
                out.push(b'/');
            }
            while r < len && bytes[r] != b'/' {
                out.push(bytes[r]);
                r += 1;
            }
        }
    }

    if out.is_empty() {
        return ".".to_string();
    }
    // Only whole ASCII-delimited elements were copied.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
