//! Plain-text rendering of the reader screen.

use std::fmt::Write;

use crate::app::ReaderApp;
use crate::catalog::Testament;
use crate::player::AudioState;

const RULE: &str = "────────────────────────────────────────";

pub fn render(app: &ReaderApp) -> String {
    let mut out = String::new();
    if app.selection().sidebar_open() {
        render_sidebar(app, &mut out);
    }
    render_header(app, &mut out);
    render_body(app, &mut out);
    render_chapter_strip(app, &mut out);
    out
}

fn render_sidebar(app: &ReaderApp, out: &mut String) {
    let selection = app.selection();
    let _ = writeln!(out, "{RULE}\n恩典聖經");
    if !selection.filter().is_empty() {
        let _ = writeln!(out, "搜尋: {}", selection.filter());
    }

    for testament in [Testament::Old, Testament::New] {
        let books = selection.filtered_in(testament);
        let _ = writeln!(out, "\n{}", testament.heading());
        if books.is_empty() {
            let _ = writeln!(out, "  (無)");
        }
        for book in books {
            let marker = if book.id == selection.book().id { "▸" } else { " " };
            let _ = writeln!(
                out,
                " {marker} {:<14} {:>3}/{:<3} [{}]",
                book.name,
                app.progress().completed_count(book.id),
                book.chapters,
                book.id
            );
        }
    }
    let _ = writeln!(out, "{RULE}");
}

pub fn play_label(state: AudioState, content_loading: bool) -> &'static str {
    match state {
        AudioState::Loading => "正在讀經...",
        AudioState::Playing => "暫停",
        AudioState::Paused => "繼續朗讀",
        _ if content_loading => "開始朗讀 (載入中)",
        AudioState::Idle | AudioState::Error => "開始朗讀",
    }
}

fn render_header(app: &ReaderApp, out: &mut String) {
    let book = app.selection().book();
    let chapter = app.selection().chapter();
    let done = app.progress().is_completed(book.id, chapter);

    let _ = writeln!(out, "\n{} 第 {} 章 {}", book.name, chapter, if done { "✔" } else { "" });
    let _ = writeln!(
        out,
        "{} • 已讀 {} / {} 章    [{}]",
        book.testament.label(),
        app.progress().completed_count(book.id),
        book.chapters,
        play_label(app.audio_state(), app.content().is_loading())
    );
    let _ = writeln!(out, "{RULE}");
}

fn render_body(app: &ReaderApp, out: &mut String) {
    match app.content().display_text() {
        Some(text) => {
            let _ = writeln!(out, "{text}");
        }
        None => {
            // Loading skeleton
            let _ = writeln!(out, "        ░░░░░░░░░░░░░░░░");
            for _ in 0..5 {
                let _ = writeln!(out, "░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░");
            }
        }
    }
    let _ = writeln!(out, "{RULE}");
}

fn render_chapter_strip(app: &ReaderApp, out: &mut String) {
    let book = app.selection().book();
    let current = app.selection().chapter();
    let playing = app.audio_state() == AudioState::Playing;

    let cells: Vec<String> = (1..=book.chapters)
        .map(|chap| {
            let done = app.progress().is_completed(book.id, chap);
            let check = if done { "✔" } else { "" };
            if chap == current {
                let icon = if playing { "♪" } else { "" };
                format!("[{icon}{chap}{check}]")
            } else {
                format!(" {chap}{check} ")
            }
        })
        .collect();

    let _ = writeln!(out, "章節快速切換與勾選");
    for row in cells.chunks(10) {
        let _ = writeln!(out, "{}", row.join(""));
    }
}
