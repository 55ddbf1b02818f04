//! # Etiquetador Morfossintático (POS)
//!
//! Atribui a cada token uma tag do **Penn Treebank** em duas passadas:
//!
//! 1. **Tag inicial** por token: pontuação, números, léxico de classe fechada,
//!    verbos irregulares, maiúsculas (nome próprio) e regras de sufixo.
//! 2. **Reparos contextuais** por sentença, que resolvem as ambiguidades mais
//!    comuns do inglês olhando os vizinhos:
//!
//! | Caso                 | Regra                                              |
//! |----------------------|----------------------------------------------------|
//! | `to go`, `can go`    | depois de TO/MD o verbo fica na forma base (VB)    |
//! | `they run`           | forma base depois de sujeito vira presente (VBP)   |
//! | `the run`            | forma base depois de determinante vira nome (NN)   |
//! | `fox jumps`          | plural com radical verbal depois de sujeito → VBZ  |
//! | `has jumped`         | passado depois de have/be → particípio (VBN)       |
//! | `'s`                 | possessivo (POS) ou "is" (VBZ)                     |
//!
//! No fim, cada token recebe classe universal, lema, forma ortográfica e as flags
//! de stop word e alfabético.

use crate::doc::Doc;
use crate::lexicon::{Lexicon, Upos};

/// Rótulos que contam como "sujeito" para os reparos de concordância
const SUBJECT_TAGS: &[&str] = &["PRP", "NN", "NNS", "NNP", "NNPS", "WP", "WDT", "EX", "CD"];

/// Tags que podem abrir um sintagma nominal
const NOMINAL_TAGS: &[&str] = &["DT", "PRP$", "WP$", "JJ", "JJR", "JJS", "CD", "NN", "NNS", "NNP", "NNPS"];

/// Sufixos de adjetivo
const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "al", "ic", "less", "ish", "ary"];

/// Sufixos de verbo na forma base
const VERB_SUFFIXES: &[&str] = &["ize", "ise", "ify"];

/// Pronomes oblíquos: nunca sujeito
const OBJECT_PRONOUNS: &[&str] = &["me", "him", "us", "them", "whom"];

/// Palavras que, depois de um verbo e sem objeto em seguida, são partículas (RP)
const PARTICLES: &[&str] = &["up", "out", "off", "down", "away", "back", "over", "in", "on"];

/// Etiqueta todos os tokens do documento.
pub fn tag(doc: &mut Doc, lexicon: &Lexicon) {
    for range in doc.sents.clone() {
        let tokens = &mut doc.tokens[range];
        let texts: Vec<String> = tokens.iter().map(|t| t.text().to_string()).collect();

        let mut tags: Vec<&'static str> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| initial_tag(lexicon, text, i == 0))
            .collect();

        let attached: Vec<bool> = (0..tokens.len())
            .map(|i| i + 1 < tokens.len() && tokens[i].token.end == tokens[i + 1].token.start)
            .collect();
        repair(lexicon, &texts, &attached, &mut tags);

        for ((token, text), tag) in tokens.iter_mut().zip(&texts).zip(tags) {
            let lower = text.to_lowercase();
            token.tag = tag.to_string();
            token.pos = Upos::from_tag(tag);
            token.lemma = lexicon.lemmatize(text, tag);
            token.is_stop = lexicon.is_stop(&lower);
            token.is_alpha = !text.is_empty() && text.chars().all(char::is_alphabetic);
            token.shape = word_shape(text);
        }
    }
}

/// Tag de um token isolado, sem olhar vizinhos.
pub fn initial_tag(lexicon: &Lexicon, text: &str, sentence_start: bool) -> &'static str {
    if let Some(tag) = punctuation_tag(text) {
        return tag;
    }
    if text == "'s" || text == "\u{2019}s" {
        return "POS";
    }
    if is_number(text) {
        return "CD";
    }
    if is_ordinal(text) {
        return "JJ";
    }

    let lower = text.to_lowercase();
    let first_upper = text.chars().next().is_some_and(char::is_uppercase);
    let all_upper = text.chars().count() > 1 && text.chars().all(|c| !c.is_lowercase());

    // Palavras capitalizadas no meio da frase são nomes próprios ("May", "US")
    if !first_upper || (sentence_start && !all_upper) || text == "I" {
        if let Some(tag) = lexicon.closed_class(&lower) {
            return tag;
        }
        if let Some((_, tag)) = lexicon.irregular_verb(&lower) {
            return tag;
        }
    }

    if first_upper && !sentence_start {
        return proper_tag(text);
    }

    let tag = open_class_tag(lexicon, &lower);
    if first_upper && sentence_start && tag == "NN" && !lexicon.is_adjective(&lower) {
        // palavra desconhecida capitalizada no início da sentença
        return "NNP";
    }
    tag
}

/// Tag para pontuação e símbolos
fn punctuation_tag(text: &str) -> Option<&'static str> {
    if text.chars().any(char::is_alphanumeric) {
        return None;
    }
    let tag = match text {
        "." | "!" | "?" | "\u{2026}" => ".",
        "," => ",",
        ":" | ";" | "--" | "\u{2013}" | "\u{2014}" => ":",
        "-" => "HYPH",
        "(" | "[" | "{" => "-LRB-",
        ")" | "]" | "}" => "-RRB-",
        "\u{201C}" | "``" => "``",
        "\"" | "'" | "\u{201D}" | "''" | "\u{2018}" | "\u{2019}" => "''",
        "$" | "\u{20AC}" | "\u{00A3}" | "\u{00A5}" => "$",
        "#" => "#",
        "%" => "NN",
        "&" => "CC",
        _ => "SYM",
    };
    Some(tag)
}

/// Tag de nome próprio (plural se for sigla terminada em "s", ex: "ATMs")
fn proper_tag(text: &str) -> &'static str {
    let chars: Vec<char> = text.chars().collect();
    let plural_acronym = chars.len() > 2
        && chars[chars.len() - 1] == 's'
        && chars[..chars.len() - 1].iter().all(|c| c.is_uppercase());
    if plural_acronym {
        "NNPS"
    } else {
        "NNP"
    }
}

/// Tag para palavras de classe aberta (adjetivos, verbos, nomes)
fn open_class_tag(lexicon: &Lexicon, lower: &str) -> &'static str {
    if lexicon.is_adjective(lower) {
        return "JJ";
    }
    if lexicon.is_verb_base(lower) {
        return "VB";
    }
    if lower.contains('-') {
        return "JJ";
    }
    let len = lower.chars().count();
    if len > 4 && lower.ends_with("ly") {
        return "RB";
    }
    if len > 4 && lower.ends_with("ing") {
        return "VBG";
    }
    if len > 3 && lower.ends_with("ed") {
        return "VBD";
    }
    if VERB_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return "VB";
    }
    if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) && len > 4 {
        return "JJ";
    }
    if let Some(stem) = lower.strip_suffix('s') {
        if !lower.ends_with("ss") && !lower.ends_with("us") && !lower.ends_with("is") && !stem.is_empty() {
            return "NNS";
        }
    }
    "NN"
}

/// Reparos contextuais sobre as tags iniciais de uma sentença.
fn repair(lexicon: &Lexicon, texts: &[String], attached: &[bool], tags: &mut [&'static str]) {
    let n = tags.len();
    let lower: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
    let lemma_of = |i: usize, tags: &[&str]| lexicon.lemmatize(&texts[i], tags[i]);

    for i in 0..n {
        let prev = i.checked_sub(1).map(|p| tags[p]);
        let next = tags.get(i + 1).copied();

        let current = tags[i];
        match current {
            // Aspas retas: abertura quando grudadas na palavra seguinte
            "''" if matches!(texts[i].as_str(), "\"" | "'") => {
                let opens_next = attached[i] && next.is_some_and(|t| t != "." && t != ",");
                let closes_prev = i > 0 && attached[i - 1];
                if opens_next && !closes_prev {
                    tags[i] = "``";
                }
            }
            "POS" => {
                let after_pronoun = prev.is_some_and(|t| matches!(t, "PRP" | "EX" | "WP" | "WDT" | "DT"));
                let before_verbal = next.is_some_and(|t| matches!(t, "VBG" | "VBN" | "DT" | "RB" | "IN" | "TO"));
                if after_pronoun || (before_verbal && prev.is_some_and(|t| t.starts_with("NN"))) {
                    tags[i] = "VBZ";
                }
            }
            "RB" if lower[i] == "there" => {
                let before_be = i + 1 < n && (lemma_of(i + 1, tags) == "be" || tags[i + 1] == "MD");
                if before_be {
                    tags[i] = "EX";
                }
            }
            "DT" if lower[i] == "that" => {
                tags[i] = match (prev, next) {
                    (_, Some(t)) if t.starts_with("NN") || t.starts_with("JJ") => "DT",
                    (Some(p), Some(t)) if p.starts_with("NN") && (t.starts_with("VB") || t == "MD" || t == "PRP") => "WDT",
                    (Some(p), _) if p.starts_with("VB") => "IN",
                    _ => "DT",
                };
            }
            "PRP" if lower[i] == "her" => {
                if next.is_some_and(|t| t.starts_with("NN") || t.starts_with("JJ")) {
                    tags[i] = "PRP$";
                }
            }
            "IN" if lower[i] == "like" => {
                if prev.is_some_and(|t| matches!(t, "PRP" | "NNS")) && !OBJECT_PRONOUNS.contains(&lower[i - 1].as_str()) {
                    tags[i] = "VBP";
                }
            }
            "JJR" | "JJS" if matches!(lower[i].as_str(), "more" | "most" | "less" | "least") => {
                if next.is_some_and(|t| t.starts_with("JJ") || t == "RB") {
                    tags[i] = if current == "JJR" { "RBR" } else { "RBS" };
                }
            }
            _ => {}
        }
    }

    // Formas verbais dependem das tags já reparadas à esquerda
    for i in 0..n {
        let prev_index = (0..i).rev().find(|&p| tags[p] != "RB");
        let prev = prev_index.map(|p| tags[p]);
        let next = tags.get(i + 1).copied();
        let prev_lemma = prev_index.map(|p| lemma_of(p, tags));

        let current = tags[i];
        match current {
            "VB" | "VBP" | "VBZ" | "NN" | "NNS" if matches!(prev, Some("TO") | Some("MD")) => {
                let verbish = matches!(current, "VB" | "VBP" | "VBZ")
                    || lexicon.is_verb_base(&lower[i])
                    || lexicon.is_verb_base(&lexicon.verb_lemma(&lower[i]));
                if verbish {
                    tags[i] = "VB";
                }
            }
            "VB" | "VBP" if prev_lemma.as_deref() == Some("do") && prev.is_some_and(|t| t != "VBN") => {
                tags[i] = "VB";
            }
            "VB" => {
                tags[i] = match prev {
                    None => "VB",
                    Some(p) if matches!(p, "DT" | "JJ" | "JJR" | "JJS" | "PRP$" | "POS" | "IN" | "CD" | "WP$") => "NN",
                    Some(p) if SUBJECT_TAGS.contains(&p) => {
                        if prev_index.is_some_and(|p| OBJECT_PRONOUNS.contains(&lower[p].as_str())) {
                            "VB"
                        } else {
                            "VBP"
                        }
                    }
                    Some(_) => "VB",
                };
            }
            "NNS" => {
                let verb_stem = lexicon.is_verb_base(&lexicon.verb_lemma(&lower[i]));
                let after_subject = prev.is_some_and(|p| matches!(p, "NN" | "NNP" | "PRP" | "WDT" | "WP"));
                if verb_stem && after_subject {
                    tags[i] = "VBZ";
                }
            }
            "VBD" => {
                let after_aux = prev_lemma.as_deref().is_some_and(|l| l == "have" || l == "be")
                    && prev.is_some_and(|t| t.starts_with("VB"));
                let adjectival = prev.is_some_and(|t| matches!(t, "DT" | "PRP$" | "JJ"))
                    && next.is_some_and(|t| t.starts_with("NN"));
                let after_get = prev_lemma.as_deref() == Some("get");
                if after_aux || after_get {
                    tags[i] = "VBN";
                } else if adjectival {
                    tags[i] = "JJ";
                }
            }
            "IN" if PARTICLES.contains(&lower[i].as_str()) => {
                let after_verb = prev.is_some_and(|t| t.starts_with("VB"));
                let object_follows = next.is_some_and(|t| NOMINAL_TAGS.contains(&t) || t == "PRP");
                if after_verb && !object_follows {
                    tags[i] = "RP";
                }
            }
            _ => {}
        }
    }

    // "to" sem verbo depois é preposição
    for i in 0..n {
        if tags[i] == "TO" && tags.get(i + 1).map_or(true, |t| *t != "VB") {
            tags[i] = "IN";
        }
    }
}

/// Números: dígitos com separadores ("3.50", "1,000", "2024")
fn is_number(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ':' | '/'))
}

/// Ordinais numéricos ("1st", "22nd")
fn is_ordinal(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["st", "nd", "rd", "th"].iter().any(|suffix| {
        lower
            .strip_suffix(suffix)
            .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
    })
}

/// Forma ortográfica: letras viram `X`/`x`, dígitos viram `d`, o resto se mantém;
/// sequências do mesmo caractere param em quatro repetições.
pub fn word_shape(text: &str) -> String {
    let mut shape = String::with_capacity(text.len());
    let mut last = None;
    let mut run = 0;
    for c in text.chars() {
        let mapped = if c.is_alphabetic() {
            if c.is_uppercase() {
                'X'
            } else {
                'x'
            }
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };
        if Some(mapped) == last {
            run += 1;
        } else {
            run = 0;
            last = Some(mapped);
        }
        if run < 4 {
            shape.push(mapped);
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{split_sentences, tokenize};

    fn tags_of(text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        tag(&mut doc, &Lexicon::english());
        doc.tokens.iter().map(|t| t.tag.clone()).collect()
    }

    #[test]
    fn test_tag_simple_sentence() {
        assert_eq!(
            tags_of("The quick brown fox jumps over the lazy dog."),
            vec!["DT", "JJ", "JJ", "NN", "VBZ", "IN", "DT", "JJ", "NN", "."]
        );
    }

    #[test]
    fn test_tag_modal_and_negation() {
        assert_eq!(
            tags_of("Dr. Smith can't go."),
            vec!["NNP", "NNP", "MD", "RB", "VB", "."]
        );
    }

    #[test]
    fn test_tag_copula_and_pronoun() {
        assert_eq!(tags_of("He is sick."), vec!["PRP", "VBZ", "JJ", "."]);
    }

    #[test]
    fn test_tag_possessive_vs_is() {
        assert_eq!(tags_of("John's dog barked.")[1], "POS");
        assert_eq!(tags_of("It's raining.")[1], "VBZ");
    }

    #[test]
    fn test_tag_perfect_participle() {
        let tags = tags_of("She has stopped the car.");
        assert_eq!(tags[1], "VBZ");
        assert_eq!(tags[2], "VBN");
    }

    #[test]
    fn test_tag_infinitive_and_preposition() {
        let tags = tags_of("I want to go to the park.");
        assert_eq!(tags, vec!["PRP", "VBP", "TO", "VB", "IN", "DT", "NN", "."]);
    }

    #[test]
    fn test_annotations() {
        let text = "The dogs were running.";
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        tag(&mut doc, &Lexicon::english());

        let dogs = &doc.tokens[1];
        assert_eq!(dogs.pos, Upos::Noun);
        assert_eq!(dogs.lemma, "dog");
        assert!(dogs.is_alpha);
        assert!(!dogs.is_stop);
        assert!(doc.tokens[0].is_stop);
        assert_eq!(doc.tokens[2].lemma, "be");
        assert_eq!(doc.tokens[3].lemma, "run");
        assert!(!doc.tokens[4].is_alpha);
    }

    #[test]
    fn test_word_shape() {
        assert_eq!(word_shape("Apple"), "Xxxxx");
        assert_eq!(word_shape("Internationalization"), "Xxxxx");
        assert_eq!(word_shape("3.50"), "d.dd");
        assert_eq!(word_shape("U.S."), "X.X.");
        assert_eq!(word_shape("n't"), "x'x");
    }
}
