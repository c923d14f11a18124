//! Replays scripted insert/delete commands against a tree.
//!
//! A script is plain text with one command per line:
//!
//! ```text
//! insert <key> <pointer>
//! delete <key> <pointer>
//! ```
//!
//! Tokens are separated by whitespace. Lines starting with any other word, and
//! blank lines, are not commands; they still produce a frame so a viewer can
//! step through the script line by line. The first malformed command stops the
//! replay.

use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::PlaybackError;
use crate::types::BPlusTree;

/// One parsed script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<K, P> {
    Insert(K, P),
    Delete(K, P),
}

impl<K: FromStr, P: FromStr> Command<K, P> {
    /// Parses one script line. `line` is the 1-based line number used in
    /// error reports.
    ///
    /// Returns `Ok(None)` for lines that are not commands.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::playback::Command;
    ///
    /// let cmd = Command::<String, i64>::parse(1, "insert apple 7").unwrap();
    /// assert_eq!(cmd, Some(Command::Insert("apple".to_string(), 7)));
    /// assert_eq!(Command::<String, i64>::parse(2, "# comment").unwrap(), None);
    /// assert!(Command::<String, i64>::parse(3, "delete apple").is_err());
    /// ```
    pub fn parse(line: usize, text: &str) -> Result<Option<Self>, PlaybackError> {
        let mut tokens = text.split_whitespace();
        let build: fn(K, P) -> Self = match tokens.next() {
            Some("insert") => Command::Insert,
            Some("delete") => Command::Delete,
            _ => return Ok(None),
        };

        let missing = |token: &'static str| PlaybackError::MissingToken {
            line,
            token,
            text: text.to_string(),
        };
        let key_token = tokens.next().ok_or_else(|| missing("key"))?;
        let pointer_token = tokens.next().ok_or_else(|| missing("pointer"))?;
        if tokens.next().is_some() {
            return Err(PlaybackError::TrailingInput {
                line,
                text: text.to_string(),
            });
        }

        let key = key_token.parse().map_err(|_| PlaybackError::InvalidKey {
            line,
            token: key_token.to_string(),
            text: text.to_string(),
        })?;
        let pointer = pointer_token
            .parse()
            .map_err(|_| PlaybackError::InvalidPointer {
                line,
                token: pointer_token.to_string(),
                text: text.to_string(),
            })?;
        Ok(Some(build(key, pointer)))
    }
}

impl<K: Ord + Clone, P: PartialEq> Command<K, P> {
    /// Applies the command, returning whether the tree changed.
    pub fn apply(self, tree: &mut BPlusTree<K, P>) -> bool {
        match self {
            Command::Insert(key, pointer) => tree.insert(key, pointer),
            Command::Delete(key, pointer) => tree.delete(&key, &pointer),
        }
    }
}

/// The state of the tree right after one script line.
#[derive(Debug, Clone)]
pub struct Frame<K, P> {
    /// 1-based line number in the script.
    pub line: usize,
    /// The source line, without its line terminator.
    pub text: String,
    /// Snapshot of the tree after the line was applied.
    pub tree: BPlusTree<K, P>,
}

/// Outcome of a replay: every frame recorded, and the error that stopped the
/// replay early, if any.
#[derive(Debug)]
pub struct Replay<K, P> {
    pub frames: Vec<Frame<K, P>>,
    pub error: Option<PlaybackError>,
}

impl<K, P> Replay<K, P> {
    /// Returns true if the whole script was applied.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Applies `script` to `tree` line by line, snapshotting the tree after each
/// line.
///
/// # Examples
///
/// ```
/// use bptree::{playback, BPlusTree};
///
/// let mut tree = BPlusTree::<String, i64>::new(4).unwrap();
/// let replay = playback::replay(&mut tree, "insert a 1\ninsert b 2\ndelete a 1\n");
/// assert!(replay.is_complete());
/// assert_eq!(replay.frames.len(), 3);
/// assert_eq!(replay.frames[1].tree.len(), 2);
/// assert_eq!(tree.len(), 1);
/// ```
pub fn replay<K, P>(tree: &mut BPlusTree<K, P>, script: &str) -> Replay<K, P>
where
    K: Ord + Clone + FromStr,
    P: PartialEq + Clone + FromStr,
{
    let mut frames = Vec::new();
    for (index, text) in script.lines().enumerate() {
        let line = index + 1;
        match Command::parse(line, text) {
            Ok(Some(command)) => {
                let changed = command.apply(tree);
                debug!(line, changed, "applied playback command");
            }
            Ok(None) => debug!(line, "skipped non-command line"),
            Err(error) => {
                warn!(line, %error, "playback stopped");
                return Replay {
                    frames,
                    error: Some(error),
                };
            }
        }
        frames.push(Frame {
            line,
            text: text.to_string(),
            tree: tree.clone(),
        });
    }
    Replay {
        frames,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Cmd = Command<String, i64>;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Cmd::parse(1, "  delete  k   -3 ").unwrap(),
            Some(Command::Delete("k".to_string(), -3))
        );
        assert_eq!(Cmd::parse(1, "").unwrap(), None);
        assert_eq!(Cmd::parse(1, "print tree").unwrap(), None);
        assert_eq!(Cmd::parse(1, "INSERT a 1").unwrap(), None);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = Cmd::parse(4, "insert").unwrap_err();
        assert!(matches!(err, PlaybackError::MissingToken { token: "key", .. }));
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.text(), Some("insert"));

        let err = Cmd::parse(5, "insert a").unwrap_err();
        assert!(matches!(err, PlaybackError::MissingToken { token: "pointer", .. }));

        let err = Cmd::parse(6, "insert a x").unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidPointer { ref token, .. } if token == "x"));

        let err = Cmd::parse(7, "insert a 1 2").unwrap_err();
        assert!(matches!(err, PlaybackError::TrailingInput { line: 7, .. }));

        let err = Command::<i32, i64>::parse(8, "delete a 1").unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidKey { ref token, .. } if token == "a"));
    }

    #[test]
    fn test_frames_are_independent_snapshots() {
        let mut tree = BPlusTree::<String, i64>::new(3).unwrap();
        let script = "insert a 1\ninsert b 2\ninsert c 3\nnoop\ndelete b 2";
        let replay = replay(&mut tree, script);

        assert!(replay.is_complete());
        let lens: Vec<usize> = replay.frames.iter().map(|f| f.tree.len()).collect();
        assert_eq!(lens, vec![1, 2, 3, 3, 2]);
        assert_eq!(replay.frames[2].tree.height(), 2);
        assert_eq!(replay.frames[3].text, "noop");
        assert!(replay.frames[2].tree.contains(&"b".to_string(), &2));
        assert!(!tree.contains(&"b".to_string(), &2));
    }

    #[test]
    fn test_replay_stops_at_first_malformed_line() {
        let mut tree = BPlusTree::<String, i64>::new(4).unwrap();
        let replay = replay(&mut tree, "insert a 1\ninsert b\ninsert c 3");

        assert_eq!(replay.frames.len(), 1);
        let error = replay.error.unwrap();
        assert_eq!(error.line(), Some(2));
        assert_eq!(error.text(), Some("insert b"));
        assert_eq!(tree.len(), 1);
    }
}
