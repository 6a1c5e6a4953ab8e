use super::page::{FormatRow, ListArea, Page, SubtitleRow};
use super::tabs::Tab;
use crate::config::QUALITY_HEIGHTS;
use std::fmt::Write;

pub fn render(page: &Page) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "URL: {}", page.url_input);
    if !page.title.is_empty() {
        let _ = writeln!(out, "{}", page.title);
    }
    if !page.meta.is_empty() {
        let _ = writeln!(out, "{}", page.meta);
    }
    if page.thumbnail.visible {
        if let Some(src) = &page.thumbnail.src {
            let _ = writeln!(out, "Thumbnail: {}", src);
        }
    }
    if !page.note.is_empty() {
        let _ = writeln!(out, "Note: {}", page.note);
    }
    let _ = writeln!(out, "{}", render_tab_strip(page));

    for tab in Tab::ALL {
        if !page.tabs.is_section_active(&tab.section_id()) {
            continue;
        }
        match tab {
            Tab::Formats => out.push_str(&render_format_area(&page.formats)),
            Tab::Subtitles => out.push_str(&render_subtitle_area(&page.subtitles)),
            Tab::Merge => out.push_str(&render_merge(page)),
        }
    }

    if !page.status.is_empty() {
        let _ = writeln!(out, "» {}", page.status);
    }
    out
}

/// Formats and subtitles one after the other, for one-shot output.
pub fn render_lists(page: &Page) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", Tab::Formats.label());
    out.push_str(&render_format_area(&page.formats));
    let _ = writeln!(out, "== {} ==", Tab::Subtitles.label());
    out.push_str(&render_subtitle_area(&page.subtitles));
    out
}

fn render_tab_strip(page: &Page) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            if page.tabs.is_active(*tab) {
                format!("[{}]", tab.label())
            } else {
                format!(" {} ", tab.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_format_area(area: &ListArea<FormatRow>) -> String {
    if let Some(text) = area.message() {
        return format!("{}\n", text);
    }
    area.rows()
        .iter()
        .enumerate()
        .map(|(i, row)| format!("{:>3}. {}\n", i + 1, render_format_row(row)))
        .collect()
}

fn render_format_row(row: &FormatRow) -> String {
    let direct = if row.direct_url.is_some() {
        "Direct"
    } else {
        "-"
    };
    let copy = if row.direct_url.is_some() { "Copy" } else { "-" };
    format!(
        "{:<20} {:<5} {:>10}  {:<22} {} | Server | {}",
        row.quality, row.ext, row.size, row.detail, direct, copy
    )
}

fn render_subtitle_area(area: &ListArea<SubtitleRow>) -> String {
    if let Some(text) = area.message() {
        return format!("{}\n", text);
    }
    area.rows()
        .iter()
        .enumerate()
        .map(|(i, row)| format!("{:>3}. {}\n", i + 1, render_subtitle_row(row)))
        .collect()
}

fn render_subtitle_row(row: &SubtitleRow) -> String {
    let actions = if row.url.is_some() {
        "Download | Copy"
    } else {
        "-"
    };
    format!("{:<10} .{:<5} {}", row.lang, row.ext, actions)
}

fn render_merge(page: &Page) -> String {
    let heights: Vec<String> = QUALITY_HEIGHTS
        .iter()
        .map(|h| {
            if *h == page.height {
                format!("[{}p]", h)
            } else {
                format!("{}p", h)
            }
        })
        .collect();
    format!(
        "Quality: {}\nmp4 - merge best video+audio up to {}p on the server\nmp3 - extract audio on the server\n",
        heights.join(" "),
        page.height
    )
}
