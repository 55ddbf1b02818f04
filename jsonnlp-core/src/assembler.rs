//! # Montador JSON-NLP
//!
//! Lê o [`Doc`] produzido pelo pipeline e monta o documento JSON-NLP:
//!
//! 1. **Tokens e sentenças**: ids sequenciais 1-based no documento inteiro,
//!    sem reiniciar a cada sentença. No mesmo passo saem as árvores de
//!    constituintes de cada sentença.
//! 2. **Expressões**: sintagmas nominais com mais de um token.
//! 3. **Dependências**: um bloco `universal` por sentença; a raiz tem `gov = 0`.
//! 4. **Correferências**: cada cadeia com o representante e os referentes, com
//!    o núcleo calculado sobre as dependências já montadas.
//!
//! Duas tabelas traduzem as referências internas do pipeline (posições de token)
//! para ids do documento: fim da sentença (em caracteres) → número da sentença, e
//! (número da sentença, posição do token) → id. Uma referência sem entrada na
//! tabela é erro ([`NlpError::UnresolvedToken`]), nunca um id solto.
//!
//! Uma árvore de constituintes que não pode ser formatada não derruba o
//! documento: a sentença fica fora de `constituents` e o motivo é registrado
//! em [`ConstituentOutcome::Skipped`].

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde_json::{Map, Value};
use tracing::debug;

use crate::doc::Doc;
use crate::error::{NlpError, Result};
use crate::head::find_head;
use crate::jsonnlp::{
    base_document, build_coreference, get_base, remove_empty_fields, ConstituentEntry,
    DependencyArc, DependencyBlock, Document, Expression, JsonNlp, Mention, SentenceEntry,
    TokenEntry, TokenMisc,
};
use crate::lexicon::morph_features;
use crate::parser::DepLabel;
use crate::pipeline::Language;

/// Blocos opcionais do documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub coreferences: bool,
    pub constituents: bool,
    pub dependencies: bool,
    pub expressions: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            coreferences: true,
            constituents: true,
            dependencies: true,
            expressions: true,
        }
    }
}

/// Por que uma sentença ficou sem árvore de constituintes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// O pipeline não tem o estágio de constituintes
    MissingParse,
    /// O estágio falhou para a sentença
    ParseFailed(String),
    EmptyBracketing,
    UnbalancedBracketing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingParse => f.write_str("sem árvore de constituintes"),
            SkipReason::ParseFailed(reason) => write!(f, "falha na análise: {reason}"),
            SkipReason::EmptyBracketing => f.write_str("árvore vazia"),
            SkipReason::UnbalancedBracketing => f.write_str("parênteses desbalanceados"),
        }
    }
}

/// Resultado da formatação da árvore de constituintes de uma sentença.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstituentOutcome {
    Built(ConstituentEntry),
    Skipped { sentence_id: usize, reason: SkipReason },
}

/// Documento montado e o relatório das árvores de constituintes.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub json: JsonNlp,
    pub constituents: Vec<ConstituentOutcome>,
}

impl Assembly {
    pub fn document(&self) -> Option<&Document> {
        self.json.documents.first()
    }

    /// JSON final, já sem campos vazios
    pub fn into_value(self) -> Result<Value> {
        Ok(remove_empty_fields(serde_json::to_value(&self.json)?))
    }
}

/// Envolve a árvore num nó `ROOT`, a menos que ela já comece com um.
pub fn build_constituents(sentence_id: usize, bracketing: &str) -> std::result::Result<ConstituentEntry, SkipReason> {
    let s = bracketing.trim();
    let (Some(open), Some(close)) = (s.chars().next(), s.chars().last()) else {
        return Err(SkipReason::EmptyBracketing);
    };
    if !is_balanced(s) {
        return Err(SkipReason::UnbalancedBracketing);
    }
    let label: String = s.chars().skip(1).take(4).collect();
    let labeled_bracketing = if label == "ROOT" {
        s.to_string()
    } else {
        format!("{open}ROOT {s}{close}")
    };
    Ok(ConstituentEntry { sentence_id, labeled_bracketing })
}

fn is_balanced(s: &str) -> bool {
    let mut depth: i64 = 0;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0 && s.starts_with('(')
}

/// Tabelas de tradução posição do pipeline → id do documento
struct Lookup {
    /// fim da sentença em caracteres → número da sentença
    sentences: HashMap<usize, usize>,
    /// (número da sentença, posição do token) → id
    tokens: HashMap<(usize, usize), usize>,
}

impl Lookup {
    fn sentence_of(&self, doc: &Doc, index: usize) -> Result<usize> {
        doc.sent_of(index)
            .and_then(|s| doc.sent_end_char(s))
            .and_then(|end| self.sentences.get(&end).copied())
            .ok_or(NlpError::UnresolvedToken { sentence: 0, index })
    }

    fn token(&self, sentence: usize, index: usize) -> Result<usize> {
        self.tokens
            .get(&(sentence, index))
            .copied()
            .ok_or(NlpError::UnresolvedToken { sentence, index })
    }

    /// Ids de um intervalo de posições, todos na sentença do primeiro token
    fn span(&self, doc: &Doc, span: Range<usize>) -> Result<(usize, Vec<usize>)> {
        let sentence = self.sentence_of(doc, span.start)?;
        let ids = span.map(|i| self.token(sentence, i)).collect::<Result<Vec<_>>>()?;
        Ok((sentence, ids))
    }
}

/// Processa o texto com o pipeline e monta o documento JSON-NLP.
pub fn process(language: &Language, text: &str, options: &ProcessOptions) -> Result<Assembly> {
    let mut json = get_base();
    let mut document = base_document(1);
    document.meta.source = format!("jsonnlp-core {}", env!("CARGO_PKG_VERSION"));
    document.meta.language = language.model().lang().to_string();
    document.text = text.to_string();

    if text.is_empty() {
        json.documents.push(document);
        return Ok(Assembly { json, constituents: Vec::new() });
    }

    let doc = language.process(text);
    let mut lookup = Lookup {
        sentences: HashMap::new(),
        tokens: HashMap::new(),
    };
    let mut constituents = Vec::new();

    // 1. Tokens, sentenças e constituintes
    let lang = language.model().lang();
    let mut token_id = 1;
    for (s, range) in doc.sents.iter().enumerate() {
        let sent_num = s + 1;
        let mut sentence = SentenceEntry {
            id: sent_num,
            token_from: token_id,
            token_to: token_id + range.len(),
            tokens: Vec::with_capacity(range.len()),
        };

        if options.constituents {
            let outcome = match doc.parses.as_ref().map(|parses| parses.get(s)) {
                Some(Some(Ok(bracketing))) => build_constituents(sent_num, bracketing),
                Some(Some(Err(err))) => Err(SkipReason::ParseFailed(err.to_string())),
                _ => Err(SkipReason::MissingParse),
            };
            match outcome {
                Ok(entry) => {
                    document.constituents.push(entry.clone());
                    constituents.push(ConstituentOutcome::Built(entry));
                }
                Err(reason) => {
                    debug!(sentence = sent_num, %reason, "árvore de constituintes ignorada");
                    constituents.push(ConstituentOutcome::Skipped { sentence_id: sent_num, reason });
                }
            }
        }

        if let Some(end) = doc.sent_end_char(s) {
            lookup.sentences.insert(end, sent_num);
        }

        for i in range.clone() {
            let token = &doc.tokens[i];
            let mut features = Map::new();
            features.insert("Overt".to_string(), Value::Bool(true));
            features.insert("Stop".to_string(), Value::Bool(token.is_stop));
            features.insert("Alpha".to_string(), Value::Bool(token.is_alpha));
            for (key, value) in morph_features(&token.tag) {
                features.insert(key.to_string(), Value::String(value));
            }

            document.token_list.push(TokenEntry {
                id: token_id,
                sentence_id: sent_num,
                text: token.text().to_string(),
                lemma: token.lemma.clone(),
                xpos: token.tag.clone(),
                upos: token.pos.as_str().to_string(),
                entity_iob: token.ent_iob.as_str().to_string(),
                character_offset_begin: token.token.char_start,
                character_offset_end: token.token.char_end,
                lang: lang.to_string(),
                features,
                misc: TokenMisc::default(),
                shape: token.shape.clone(),
                entity: token.ent_type.map(|label| label.as_str().to_string()),
            });
            lookup.tokens.insert((sent_num, i), token_id);
            sentence.tokens.push(token_id);
            token_id += 1;
        }
        document.sentences.insert(sent_num, sentence);
    }

    // Espaço depois do token: o próximo começa depois do fim deste
    for i in 1..document.token_list.len() {
        let gap = document.token_list[i].character_offset_begin != document.token_list[i - 1].character_offset_end;
        document.token_list[i - 1].misc.space_after = gap;
    }

    // 2. Expressões
    if options.expressions {
        for chunk in doc.noun_chunks().into_iter().filter(|chunk| chunk.len() > 1) {
            let (sentence, tokens) = lookup.span(&doc, chunk.span.clone())?;
            document.expressions.push(Expression {
                id: document.expressions.len() + 1,
                kind: "NP".to_string(),
                head: lookup.token(sentence, chunk.root)?,
                dependency: doc.tokens[chunk.root].dep.as_str().to_lowercase(),
                tokens,
            });
        }
    }

    // 3. Dependências
    if options.dependencies {
        for (s, range) in doc.sents.iter().enumerate() {
            let sent_num = s + 1;
            let mut block = DependencyBlock {
                style: "universal".to_string(),
                trees: Vec::with_capacity(range.len()),
            };
            for i in range.clone() {
                let token = &doc.tokens[i];
                let dep = lookup.token(sent_num, i)?;
                let arc = if token.dep == DepLabel::Root || token.head == i {
                    DependencyArc { lab: "root".to_string(), gov: 0, dep }
                } else {
                    DependencyArc {
                        lab: token.dep.as_str().to_string(),
                        gov: lookup.token(sent_num, token.head)?,
                        dep,
                    }
                };
                block.trees.push(arc);
            }
            document.dependencies.push(block);
        }
    }

    // 4. Correferências
    if options.coreferences {
        for (n, cluster) in doc.coref_clusters.iter().flatten().enumerate() {
            let mut entry = build_coreference(n + 1);
            let (_, tokens) = lookup.span(&doc, cluster.main.clone())?;
            let last_sentence = tokens
                .iter()
                .max()
                .and_then(|&id| document.token(id))
                .map(|t| t.sentence_id)
                .unwrap_or(0);
            entry.representative.head = find_head(&document, &tokens, last_sentence);
            entry.representative.tokens = tokens;

            for mention in &cluster.mentions {
                let (sentence, tokens) = lookup.span(&doc, mention.clone())?;
                if tokens.first().is_some_and(|id| entry.representative.tokens.contains(id)) {
                    continue;
                }
                let head = find_head(&document, &tokens, sentence);
                entry.referents.push(Mention { tokens, head });
            }
            document.coreferences.push(entry);
        }
    }

    debug!(
        tokens = document.token_list.len(),
        sentences = document.sentences.len(),
        expressions = document.expressions.len(),
        coreferences = document.coreferences.len(),
        "documento montado"
    );
    json.documents.push(document);
    Ok(Assembly { json, constituents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;

    fn english(coref: bool, constituents: bool) -> Language {
        Language::load(&PipelineConfig::new("en", coref, constituents)).unwrap()
    }

    fn assemble(text: &str) -> Assembly {
        process(&english(true, true), text, &ProcessOptions::default()).unwrap()
    }

    #[test]
    fn test_token_ids_are_contiguous() {
        let language = english(true, true);
        let text = "The quick brown fox jumps over the lazy dog. It was not amused!";
        let assembly = process(&language, text, &ProcessOptions::default()).unwrap();
        let document = assembly.document().unwrap();

        assert_eq!(document.token_list.len(), language.process(text).len());
        for (i, token) in document.token_list.iter().enumerate() {
            assert_eq!(token.id, i + 1);
        }
        let second = &document.sentences[&2];
        assert_eq!(second.token_from, 11);
        assert_eq!(second.token_to, 11 + second.tokens.len());
        assert_eq!(second.tokens.first(), Some(&11));
    }

    #[test]
    fn test_dependencies_resolve() {
        let assembly = assemble("John Smith arrived. He was tired and went home.");
        let document = assembly.document().unwrap();
        let max_id = document.token_list.len();

        assert_eq!(document.dependencies.len(), 2);
        for block in &document.dependencies {
            assert_eq!(block.style, "universal");
            let roots: Vec<_> = block.trees.iter().filter(|arc| arc.gov == 0).collect();
            assert_eq!(roots.len(), 1);
            assert_eq!(roots[0].lab, "root");
            for arc in &block.trees {
                assert!(arc.dep >= 1 && arc.dep <= max_id);
                assert!(arc.gov <= max_id);
            }
        }
        for expression in &document.expressions {
            assert!(expression.tokens.len() > 1);
            assert!(expression.tokens.contains(&expression.head));
            assert!(expression.tokens.iter().all(|&id| id >= 1 && id <= max_id));
        }
    }

    #[test]
    fn test_find_head_of_whole_sentence_is_root() {
        let assembly = assemble("The old man quietly read the newspaper.");
        let document = assembly.document().unwrap();
        let ids: Vec<usize> = document.sentences[&1].tokens.clone();
        let head = find_head(document, &ids, 1).unwrap();
        let root = document.dependencies[0].trees.iter().find(|arc| arc.dep == head).unwrap();
        assert_eq!(root.lab, "root");
        assert_eq!(root.gov, 0);
    }

    #[test]
    fn test_space_after() {
        let assembly = assemble("Hello, world. Bye.");
        let document = assembly.document().unwrap();
        let spaces: Vec<bool> = document.token_list.iter().map(|t| t.misc.space_after).collect();
        // Hello , world . Bye .
        assert_eq!(spaces, vec![false, true, false, true, false, false]);
    }

    #[test]
    fn test_token_entry_fields() {
        let assembly = assemble("She runs.");
        let value = assembly.into_value().unwrap();
        let token = &value["documents"][0]["tokenList"][1];
        assert_eq!(token["text"], "runs");
        assert_eq!(token["xpos"], "VBZ");
        assert_eq!(token["upos"], "VERB");
        assert_eq!(token["lemma"], "run");
        assert_eq!(token["lang"], "en");
        assert_eq!(token["features"]["Overt"], true);
        assert_eq!(token["features"]["Tense"], "Pres");
        assert_eq!(token["characterOffsetBegin"], 4);
        assert_eq!(token["characterOffsetEnd"], 8);
        assert_eq!(token["shape"], "xxxx");
        assert!(token.get("entity").is_none());
    }

    #[test]
    fn test_constituents_are_rooted() {
        let assembly = assemble("The dog barked. The cat slept.");
        let document = assembly.document().unwrap();
        assert_eq!(document.constituents.len(), 2);
        assert_eq!(document.constituents[1].sentence_id, 2);
        for entry in &document.constituents {
            assert!(entry.labeled_bracketing.starts_with("(ROOT (S "));
        }
        assert!(assembly.constituents.iter().all(|o| matches!(o, ConstituentOutcome::Built(_))));
    }

    #[test]
    fn test_missing_parse_is_skipped() {
        let language = english(false, false);
        let assembly = process(&language, "The dog barked.", &ProcessOptions::default()).unwrap();
        assert_eq!(
            assembly.constituents,
            vec![ConstituentOutcome::Skipped { sentence_id: 1, reason: SkipReason::MissingParse }]
        );
        let value = assembly.into_value().unwrap();
        assert!(value["documents"][0].get("constituents").is_none());
        assert!(value["documents"][0].get("coreferences").is_none());
    }

    #[test]
    fn test_build_constituents() {
        let entry = build_constituents(1, "  (S (NP (NN x)))  ").unwrap();
        assert_eq!(entry.labeled_bracketing, "(ROOT (S (NP (NN x))))");
        let entry = build_constituents(2, "(ROOT (S (NP (NN x))))").unwrap();
        assert_eq!(entry.labeled_bracketing, "(ROOT (S (NP (NN x))))");
        assert_eq!(build_constituents(3, "   "), Err(SkipReason::EmptyBracketing));
        assert_eq!(build_constituents(4, "(S (NP x)"), Err(SkipReason::UnbalancedBracketing));
    }

    #[test]
    fn test_coreference_block() {
        let assembly = assemble("John Smith arrived. He was tired.");
        let document = assembly.document().unwrap();
        assert_eq!(document.coreferences.len(), 1);
        let chain = &document.coreferences[0];
        assert_eq!(chain.id, 1);
        assert_eq!(chain.representative.tokens, vec![1, 2]);
        assert_eq!(chain.representative.head, Some(2));
        assert_eq!(chain.referents, vec![Mention { tokens: vec![5], head: Some(5) }]);
    }

    #[test]
    fn test_options_disable_blocks() {
        let options = ProcessOptions {
            coreferences: false,
            constituents: false,
            dependencies: false,
            expressions: false,
        };
        let assembly = process(&english(true, true), "The big dog barked.", &options).unwrap();
        assert!(assembly.constituents.is_empty());
        let value = assembly.into_value().unwrap();
        let document = value["documents"][0].as_object().unwrap();
        for key in ["dependencies", "coreferences", "constituents", "expressions"] {
            assert!(!document.contains_key(key), "{key}");
        }
        assert!(document.contains_key("tokenList"));
    }

    #[test]
    fn test_meta_and_empty_text() {
        let value = assemble("Hi there.").into_value().unwrap();
        let meta = &value["documents"][0]["meta"];
        assert_eq!(meta["DC.language"], "en");
        assert!(meta["DC.source"].as_str().unwrap().starts_with("jsonnlp-core "));
        assert_eq!(value["meta"]["DC.conformsTo"], "1.0");
        assert!(value.get("conll").is_none());

        let empty = assemble("").into_value().unwrap();
        assert!(empty["documents"][0].get("tokenList").is_none());
    }
}
