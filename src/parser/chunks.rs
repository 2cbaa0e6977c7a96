use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub content: String,
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// Fenced code block, fences included.
    Code,
    /// Contiguous pipe-table lines.
    Table,
    /// Run of ordinary lines between code blocks and tables.
    Text,
}

/// Unit of markdown the chunker never splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub kind: AtomKind,
    pub text: String,
}

impl Atom {
    fn new(kind: AtomKind, lines: &[&str]) -> Self {
        Atom {
            kind,
            text: lines.join("\n"),
        }
    }
}

/// Split markdown into chunks of at most `chunk_size` characters without
/// breaking a code block or table.
///
/// Atoms are packed greedily, joined by a blank line. An atom larger than
/// `chunk_size` becomes a chunk of its own and is not split further.
/// `chunk_size == 0` disables chunking and returns the whole input as one chunk.
pub fn chunk_by_size(markdown: &str, chunk_size: usize) -> Vec<Chunk> {
    let text = markdown.replace("\r\n", "\n").replace('\r', "\n");
    if chunk_size == 0 {
        return vec![Chunk {
            content: text.trim().to_string(),
            index: 0,
            total: 1,
        }];
    }

    let atoms = split_atoms(&text);
    let mut contents: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for atom in atoms {
        let atom_len = atom.text.chars().count();
        let joined_len = if current.is_empty() {
            atom_len
        } else {
            current_len + 2 + atom_len
        };

        if joined_len <= chunk_size {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&atom.text);
            current_len = joined_len;
            continue;
        }

        flush(&mut contents, &mut current);
        current_len = 0;
        if atom_len > chunk_size {
            debug!(
                kind = ?atom.kind,
                len = atom_len,
                limit = chunk_size,
                "atom exceeds chunk size, emitting whole"
            );
            contents.push(atom.text);
        } else {
            current = atom.text;
            current_len = atom_len;
        }
    }
    flush(&mut contents, &mut current);

    let total = contents.len();
    debug!(chunks = total, limit = chunk_size, "chunked markdown");
    contents
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk {
            content,
            index,
            total,
        })
        .collect()
}

fn flush(contents: &mut Vec<String>, current: &mut String) {
    let chunk = std::mem::take(current);
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        contents.push(trimmed.to_string());
    }
}

/// Tokenize markdown into atoms in one pass over its lines.
///
/// Every line outside a code block or table, blank lines included, belongs
/// to the surrounding text atom; only its leading and trailing blank lines
/// are trimmed. An unterminated fence runs to the end of input.
pub fn split_atoms(markdown: &str) -> Vec<Atom> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut atoms = Vec::new();
    let mut text_run: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        // ── Code fence: through the matching close, or to end of input ──
        if let Some(ticks) = opening_fence(line) {
            flush_text(&mut atoms, &mut text_run);
            let end = lines[i + 1..]
                .iter()
                .position(|l| is_closing_fence(l, ticks))
                .map_or(lines.len(), |offset| i + 1 + offset + 1);
            atoms.push(Atom::new(AtomKind::Code, &lines[i..end]));
            i = end;
            continue;
        }

        // ── Pipe table: run of table rows ──
        if is_table_line(line) {
            flush_text(&mut atoms, &mut text_run);
            let end = lines[i..]
                .iter()
                .position(|l| !is_table_line(l))
                .map_or(lines.len(), |offset| i + offset);
            atoms.push(Atom::new(AtomKind::Table, &lines[i..end]));
            i = end;
            continue;
        }

        text_run.push(line);
        i += 1;
    }
    flush_text(&mut atoms, &mut text_run);

    atoms
}

fn flush_text(atoms: &mut Vec<Atom>, text_run: &mut Vec<&str>) {
    let text = text_run.join("\n");
    text_run.clear();
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        atoms.push(Atom {
            kind: AtomKind::Text,
            text: trimmed.to_string(),
        });
    }
}

/// Backtick count of an opening fence: three or more backticks, optionally
/// followed by an info string without backticks.
fn opening_fence(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    let ticks = trimmed.chars().take_while(|&c| c == '`').count();
    if ticks < 3 || trimmed[ticks..].contains('`') {
        return None;
    }
    Some(ticks)
}

fn is_closing_fence(line: &str, ticks: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= ticks && trimmed.chars().all(|c| c == '`')
}

fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed
        .strip_prefix('|')
        .is_some_and(|rest| rest.contains('|'))
}

// ── Tests ──
