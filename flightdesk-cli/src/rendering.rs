// flightdesk-cli/src/rendering.rs

//! Terminal rendering of assistant replies. Prose goes through termimad,
//! fenced code blocks are highlighted with syntect.

use anyhow::Result;
use lazy_static::lazy_static;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_to_cmark::cmark;
use std::io::{self, Write};
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, Theme, ThemeSet},
    parsing::SyntaxSet,
    util::LinesWithEndings,
};
use termimad::{
    MadSkin,
    crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor},
};

const CODE_THEME_NAME: &str = "base16-ocean.dark";

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

fn code_theme() -> Option<&'static Theme> {
    THEME_SET
        .themes
        .get(CODE_THEME_NAME)
        .or_else(|| THEME_SET.themes.values().next())
}

/// Maps the info string of a fenced block to a syntect token.
fn syntax_token(language: &str) -> String {
    let lower = language.trim().to_lowercase();
    match lower.as_str() {
        "shell" | "bash" | "sh" => "bash".to_string(),
        "yaml" | "yml" => "yaml".to_string(),
        "markdown" | "md" => "markdown".to_string(),
        "" | "text" | "plain" => "txt".to_string(),
        _ => lower,
    }
}

fn io_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{}: {}", context, e))
}

fn highlight_code<W: Write>(writer: &mut W, code: &str, language: Option<&str>) -> io::Result<()> {
    let syntax = language
        .map(syntax_token)
        .and_then(|token| SYNTAX_SET.find_syntax_by_token(&token))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let Some(theme) = code_theme() else {
        return write!(writer, "{}", code);
    };
    let mut highlighter = HighlightLines::new(syntax, theme);

    for line in LinesWithEndings::from(code) {
        let ranges = highlighter
            .highlight_line(line, &SYNTAX_SET)
            .map_err(|e| io_error("Highlighting failed", e))?;

        for (style, content) in ranges {
            let fg = style.foreground;
            if fg.a > 0 {
                write!(
                    writer,
                    "{}",
                    SetForegroundColor(Color::Rgb {
                        r: fg.r,
                        g: fg.g,
                        b: fg.b
                    })
                )?;
            }
            if style.font_style.contains(FontStyle::BOLD) {
                write!(writer, "{}", SetAttribute(Attribute::Bold))?;
            }
            if style.font_style.contains(FontStyle::UNDERLINE) {
                write!(writer, "{}", SetAttribute(Attribute::Underlined))?;
            }
            write!(writer, "{}{}{}", content, SetAttribute(Attribute::Reset), ResetColor)?;
        }
    }
    write!(writer, "{}", ResetColor)
}

fn reply_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Cyan);
    skin.inline_code.set_bg(Color::Reset);
    skin.code_block.set_fg(Color::Reset);
    skin.code_block.set_bg(Color::Reset);
    skin
}

/// Writes the buffered prose events through termimad and clears the buffer.
fn flush_prose<W: Write>(
    events: &mut Vec<Event<'_>>,
    skin: &MadSkin,
    writer: &mut W,
) -> io::Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let mut markdown = String::new();
    cmark(events.iter(), &mut markdown).map_err(|e| io_error("Markdown generation failed", e))?;
    skin.write_text_on(writer, &markdown)
        .map_err(|e| io_error("Terminal rendering failed", e))?;
    events.clear();
    Ok(())
}

pub fn render_markdown<W: Write>(writer: &mut W, markdown_text: &str) -> Result<()> {
    let skin = reply_skin();
    let mut prose: Vec<Event<'_>> = Vec::new();
    let mut code = String::new();
    let mut code_language: Option<String> = None;
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown_text, Options::ENABLE_TABLES) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                flush_prose(&mut prose, &skin, writer)?;
                in_code_block = true;
                code_language = match kind {
                    CodeBlockKind::Fenced(lang) => Some(lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                code.clear();
                writeln!(writer)?;
            }
            Event::End(TagEnd::CodeBlock) if in_code_block => {
                highlight_code(writer, &code, code_language.as_deref())?;
                writeln!(writer)?;
                in_code_block = false;
                code_language = None;
            }
            Event::Text(text) if in_code_block => code.push_str(&text),
            other if !in_code_block => prose.push(other),
            _ => {}
        }
    }
    flush_prose(&mut prose, &skin, writer)?;
    writer.flush()?;
    Ok(())
}

pub fn print_formatted(markdown_text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    render_markdown(&mut stdout, markdown_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_token_aliases() {
        assert_eq!(syntax_token("JSON"), "json");
        assert_eq!(syntax_token("sh"), "bash");
        assert_eq!(syntax_token(""), "txt");
    }

    #[test]
    fn test_highlight_keeps_code_text() {
        let mut out = Vec::new();
        highlight_code(&mut out, "{\"flight\": \"AA100\"}\n", Some("json")).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("AA100"));
        assert!(rendered.contains("flight"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        let mut out = Vec::new();
        highlight_code(&mut out, "JFK -> LAX\n", Some("flightplan")).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("JFK -> LAX"));
    }

    #[test]
    fn test_render_keeps_prose_around_code_blocks() {
        let mut out = Vec::new();
        let reply = "Flight **AA100** is on time.\n\n```json\n{\"gate\": \"B22\"}\n```\n\nSafe travels!\n";
        render_markdown(&mut out, reply).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("AA100"));
        assert!(rendered.contains("B22"));
        assert!(rendered.contains("Safe travels!"));
    }
}
