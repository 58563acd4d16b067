//! Line-oriented command input.
//!
//! Reads stdin lines on a background task and sends parsed commands to the
//! service over a tokio channel.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// User intents understood by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open or close the book list.
    Sidebar(bool),
    Search(String),
    OpenBook(String),
    /// Tap a chapter in the strip: plays/stops the current one, selects any other.
    Chapter(u32),
    Next,
    Previous,
    Play,
    Stop,
    Pause,
    /// Toggle the completion marker; `None` means the current chapter.
    Mark(Option<u32>),
    Help,
    Quit,
}

pub const HELP: &str = "\
指令:
  books | close        開啟 / 關閉經卷列表
  search <文字>         搜尋經卷 (空白清除)
  open <id>            選擇經卷，例如 open john
  <n>                  點選第 n 章 (再次點選目前章節可朗讀 / 停止)
  next | prev          下一章 / 上一章
  play | pause | stop  朗讀控制
  mark [n]             標記 / 取消已讀 (預設目前章節)
  help | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let cmd = match word {
            "books" | "b" => Self::Sidebar(true),
            "close" => Self::Sidebar(false),
            "search" | "s" => Self::Search(rest.to_string()),
            "open" | "o" if !rest.is_empty() => Self::OpenBook(rest.to_string()),
            "next" | "n" => Self::Next,
            "prev" | "p" => Self::Previous,
            "play" => Self::Play,
            "stop" => Self::Stop,
            "pause" => Self::Pause,
            "mark" | "m" => {
                if rest.is_empty() {
                    Self::Mark(None)
                } else {
                    Self::Mark(Some(parse_chapter(rest)?))
                }
            }
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            "ch" | "c" => Self::Chapter(parse_chapter(rest)?),
            _ if word.chars().all(|c| c.is_ascii_digit()) && !word.is_empty() => {
                Self::Chapter(parse_chapter(word)?)
            }
            _ => return Err(format!("無法辨識的指令: {line}")),
        };
        Ok(cmd)
    }
}

fn parse_chapter(s: &str) -> Result<u32, String> {
    s.parse::<u32>().map_err(|_| format!("章節必須是數字: {s}"))
}

pub struct InputMonitor {
    tx: mpsc::Sender<Command>,
}

impl InputMonitor {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Read stdin until EOF, then send `Quit`.
    pub async fn run(self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match Command::parse(&line) {
                        Ok(cmd) => {
                            debug!("Command: {cmd:?}");
                            if self.tx.send(cmd).await.is_err() {
                                break;
                            }
                        }
                        Err(msg) => eprintln!("{msg} (輸入 help 查看指令)"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read input: {e}");
                    break;
                }
            }
        }

        let _ = self.tx.send(Command::Quit).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chapter_taps() {
        assert_eq!(Command::parse("3"), Ok(Command::Chapter(3)));
        assert_eq!(Command::parse(" ch 12 "), Ok(Command::Chapter(12)));
        assert!(Command::parse("ch x").is_err());
    }

    #[test]
    fn parses_marks_with_and_without_chapter() {
        assert_eq!(Command::parse("mark"), Ok(Command::Mark(None)));
        assert_eq!(Command::parse("m 7"), Ok(Command::Mark(Some(7))));
    }

    #[test]
    fn search_keeps_text_and_may_be_empty() {
        assert_eq!(Command::parse("search 約翰"), Ok(Command::Search("約翰".into())));
        assert_eq!(Command::parse("search"), Ok(Command::Search(String::new())));
    }

    #[test]
    fn open_requires_an_id() {
        assert_eq!(Command::parse("open john"), Ok(Command::OpenBook("john".into())));
        assert!(Command::parse("open").is_err());
    }

    #[test]
    fn unknown_words_are_rejected() {
        assert!(Command::parse("rewind").is_err());
    }
}
