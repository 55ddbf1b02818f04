//! # Tokenizador para Inglês
//!
//! Responsável por dividir o texto bruto em tokens individuais (palavras, pontuações)
//! e agrupar esses tokens em sentenças. Cada token preserva sua posição original
//! no texto em **bytes** (para fatiar a `String`) e em **caracteres** (para os
//! offsets `characterOffsetBegin`/`characterOffsetEnd` do JSON-NLP).
//!
//! ## Esquema de Tokenização
//!
//! 1. As fronteiras de palavra do Unicode (UAX #29) fazem o corte inicial:
//!    `"3.14"`, `"U.S"` e `"don't"` chegam inteiros, pontuação chega separada.
//! 2. Abreviações conhecidas e iniciais reabsorvem o ponto (`"Dr" + "."` → `"Dr."`).
//! 3. Clíticos do inglês são separados (`"can't"` → `"ca"`, `"n't"`;
//!    `"John's"` → `"John"`, `"'s"`).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use jsonnlp_core::tokenizer::{split_sentences, tokenize};
//!
//! let text = "Dr. Smith can't go. He is sick.";
//! let tokens = tokenize(text);
//! // "Dr.", "Smith", "ca", "n't", "go", ".", "He", "is", "sick", "."
//! assert_eq!(tokens.len(), 10);
//!
//! let sentences = split_sentences(text, &tokens);
//! assert_eq!(sentences.len(), 2);
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
///
/// O `Token` é a unidade atômica de processamento do pipeline. Os offsets em bytes
/// servem para recortar o texto; os offsets em caracteres são os que vão para o JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "Smith", ",", "n't").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice de caractere inicial (inclusive).
    pub char_start: usize,
    /// Índice de caractere final (exclusivo).
    pub char_end: usize,
    /// Índice sequencial do token no documento (0, 1, 2...).
    pub index: usize,
}

/// Abreviações que não devem ter o ponto tratado como fim de sentença
const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Sr", "Jr", "St", "Mt", "Gen", "Gov", "Sen",
    "Rep", "Capt", "Lt", "Col", "Sgt", "Inc", "Ltd", "Co", "Corp", "Bros", "vs",
    "etc", "approx", "Jan", "Feb", "Mar", "Apr", "Jun", "Jul", "Aug", "Sep", "Sept",
    "Oct", "Nov", "Dec", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun",
];

/// Clíticos separados da palavra anterior, nas variantes com apóstrofo reto e curvo
const CLITICS: &[&str] = &[
    "n't", "'s", "'re", "'ve", "'ll", "'d", "'m",
    "n\u{2019}t", "\u{2019}s", "\u{2019}re", "\u{2019}ve", "\u{2019}ll", "\u{2019}d", "\u{2019}m",
];

/// Pontuação que encerra uma sentença
const TERMINALS: &[&str] = &[".", "!", "?", "\u{2026}"];

/// Fechamentos que ficam grudados na sentença anterior (ex: `."` ou `.)`)
const CLOSERS: &[&str] = &["\"", "'", ")", "]", "}", "\u{201D}", "\u{2019}"];

/// Tokeniza um texto em inglês.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut last_byte = 0;
    let mut chars_seen = 0;

    for (start, word) in text.split_word_bound_indices() {
        chars_seen += text[last_byte..start].chars().count();
        last_byte = start;

        if word.chars().all(char::is_whitespace) {
            continue;
        }

        // Reabsorve o ponto de abreviações (ex: "Dr" + "." → "Dr.")
        if word == "." {
            if let Some(prev) = tokens.last_mut() {
                if prev.end == start && is_abbreviation(&prev.text) {
                    prev.text.push('.');
                    prev.end += 1;
                    prev.char_end += 1;
                    continue;
                }
            }
        }

        match split_clitic(word) {
            Some(split) => {
                let (base, clitic) = word.split_at(split);
                let base_chars = base.chars().count();
                push_token(&mut tokens, base, start, chars_seen);
                push_token(&mut tokens, clitic, start + split, chars_seen + base_chars);
            }
            None => push_token(&mut tokens, word, start, chars_seen),
        }
    }

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Agrupa os tokens em sentenças.
///
/// Retorna intervalos de índices de token (`start..end`, exclusivo). Uma sentença
/// termina em `.`, `!`, `?` ou reticências (junto com aspas/parênteses que fecham
/// logo em seguida) ou em uma linha em branco.
pub fn split_sentences(text: &str, tokens: &[Token]) -> Vec<Range<usize>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < tokens.len() {
        // Linha em branco antes do token i fecha a sentença corrente
        if i > start && text[tokens[i - 1].end..tokens[i].start].matches('\n').count() >= 2 {
            sentences.push(start..i);
            start = i;
        }

        if TERMINALS.contains(&tokens[i].text.as_str()) {
            let mut end = i + 1;
            while end < tokens.len()
                && tokens[end].start == tokens[end - 1].end
                && (TERMINALS.contains(&tokens[end].text.as_str())
                    || CLOSERS.contains(&tokens[end].text.as_str()))
            {
                end += 1;
            }
            sentences.push(start..end);
            start = end;
            i = end;
            continue;
        }
        i += 1;
    }

    if start < tokens.len() {
        sentences.push(start..tokens.len());
    }
    sentences
}

/// Verifica se o token anterior a um ponto é abreviação, inicial ou sigla
fn is_abbreviation(word: &str) -> bool {
    if ABBREVIATIONS.contains(&word) {
        return true;
    }
    let mut chars = word.chars();
    // Iniciais de nomes (ex: "J. Smith"), exceto pronome "I" e artigo "A"
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii_uppercase() && c != 'I' && c != 'A';
    }
    // Siglas com pontos internos (ex: "U.S", "e.g")
    word.contains('.') && word.chars().all(|c| c.is_alphabetic() || c == '.')
}

/// Retorna o byte onde começa o clítico, se a palavra terminar com um
fn split_clitic(word: &str) -> Option<usize> {
    CLITICS.iter().find_map(|clitic| {
        if word.len() <= clitic.len() {
            return None;
        }
        let split = word.len() - clitic.len();
        let tail = word.get(split..)?;
        tail.eq_ignore_ascii_case(clitic).then_some(split)
    })
}

/// Adiciona um token calculando os offsets finais
fn push_token(tokens: &mut Vec<Token>, text: &str, start: usize, char_start: usize) {
    tokens.push(Token {
        text: text.to_string(),
        start,
        end: start + text.len(),
        char_start,
        char_end: char_start + text.chars().count(),
        index: 0, // será atribuído depois
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("The quick brown fox jumps over the lazy dog.");
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens[9].text, ".");
        assert_eq!(tokens[3].start, 16);
        assert_eq!(tokens[3].end, 19);
    }

    #[test]
    fn test_tokenize_abbreviation_and_clitic() {
        let tokens = tokenize("Dr. Smith can't go.");
        assert_eq!(texts(&tokens), vec!["Dr.", "Smith", "ca", "n't", "go", "."]);
        assert_eq!(tokens[2].end, tokens[3].start);
    }

    #[test]
    fn test_tokenize_possessive() {
        let tokens = tokenize("John's dog barked.");
        assert_eq!(texts(&tokens), vec!["John", "'s", "dog", "barked", "."]);
    }

    #[test]
    fn test_tokenize_numbers_stay_whole() {
        let tokens = tokenize("It costs $3.50 today.");
        assert_eq!(texts(&tokens), vec!["It", "costs", "$", "3.50", "today", "."]);
    }

    #[test]
    fn test_char_offsets_differ_from_bytes() {
        let tokens = tokenize("Café au lait.");
        assert_eq!(tokens[0].char_start, 0);
        assert_eq!(tokens[0].char_end, 4);
        assert_eq!(tokens[0].end, 5);
        assert_eq!(tokens[1].char_start, 5);
        assert_eq!(tokens[1].start, 6);
    }

    #[test]
    fn test_indices_are_sequential() {
        let tokens = tokenize("One two. Three four!");
        for (i, t) in tokens.iter().enumerate() {
            assert_eq!(t.index, i);
        }
    }

    #[test]
    fn test_split_sentences() {
        let text = "Hello world. How are you? Fine.";
        let tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        assert_eq!(sentences, vec![0..3, 3..7, 7..9]);
    }

    #[test]
    fn test_split_sentences_keeps_closing_quote() {
        let text = "He said \"stop.\" Then he left.";
        let tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        assert_eq!(sentences.len(), 2);
        assert_eq!(tokens[sentences[0].end - 1].text, "\"");
    }

    #[test]
    fn test_split_sentences_blank_line() {
        let text = "A title\n\nBody text here";
        let tokens = tokenize(text);
        let sentences = split_sentences(text, &tokens);
        assert_eq!(sentences, vec![0..2, 2..5]);
    }

    #[test]
    fn test_split_sentences_without_terminal() {
        let text = "no punctuation at all";
        let tokens = tokenize(text);
        assert_eq!(split_sentences(text, &tokens), vec![0..4]);
        assert!(split_sentences("", &[]).is_empty());
    }
}
