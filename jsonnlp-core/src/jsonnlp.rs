//! # Esquema JSON-NLP
//!
//! Tipos que espelham o formato JSON-NLP e as funções que montam os seus
//! quadros vazios. A ordem dos campos nas structs é a ordem em que aparecem
//! no JSON (o `serde_json` está com `preserve_order`).
//!
//! ```text
//! {
//!   "meta": { "DC.conformsTo": "1.0", ... },
//!   "conll": {},
//!   "documents": [
//!     { "meta": {...}, "id": 1, "text": "...", "tokenList": [...],
//!       "sentences": { "1": {...} }, "dependencies": [...],
//!       "coreferences": [...], "constituents": [...], "expressions": [...] }
//!   ]
//! }
//! ```
//!
//! Campos vazios são removidos com [`remove_empty_fields`] antes da resposta.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Versão do esquema JSON-NLP produzido
pub const SCHEMA_VERSION: &str = "1.0";

/// Bloco de metadados Dublin Core (raiz e cada documento).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "DC.conformsTo")]
    pub conforms_to: String,
    #[serde(rename = "DC.source")]
    pub source: String,
    #[serde(rename = "DC.created")]
    pub created: String,
    #[serde(rename = "DC.date")]
    pub date: String,
    #[serde(rename = "DC.creator")]
    pub creator: String,
    #[serde(rename = "DC.publisher")]
    pub publisher: String,
    #[serde(rename = "DC.title")]
    pub title: String,
    #[serde(rename = "DC.description")]
    pub description: String,
    #[serde(rename = "DC.identifier")]
    pub identifier: String,
    #[serde(rename = "DC.language")]
    pub language: String,
    #[serde(rename = "DC.subject")]
    pub subject: String,
    #[serde(rename = "DC.contributors")]
    pub contributors: String,
    #[serde(rename = "DC.type")]
    pub kind: String,
    #[serde(rename = "DC.format")]
    pub format: String,
    #[serde(rename = "DC.relation")]
    pub relation: String,
    #[serde(rename = "DC.coverage")]
    pub coverage: String,
    #[serde(rename = "DC.rights")]
    pub rights: String,
    pub counts: Map<String, Value>,
}

impl Meta {
    /// Metadados vazios com versão do esquema e data de criação
    pub fn new() -> Self {
        let now = timestamp();
        Self {
            conforms_to: SCHEMA_VERSION.to_string(),
            source: String::new(),
            created: now.clone(),
            date: now,
            creator: String::new(),
            publisher: String::new(),
            title: String::new(),
            description: String::new(),
            identifier: String::new(),
            language: String::new(),
            subject: String::new(),
            contributors: String::new(),
            kind: String::new(),
            format: String::new(),
            relation: String::new(),
            coverage: String::new(),
            rights: String::new(),
            counts: Map::new(),
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

/// Hora local em ISO-8601 sem fração de segundo
fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Raiz do JSON-NLP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNlp {
    pub meta: Meta,
    pub conll: Map<String, Value>,
    pub documents: Vec<Document>,
}

/// Um documento processado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub meta: Meta,
    pub id: usize,
    #[serde(rename = "conllId")]
    pub conll_id: String,
    pub text: String,
    #[serde(rename = "tokenList")]
    pub token_list: Vec<TokenEntry>,
    /// Sentenças indexadas pelo id (chaves "1", "2"... no JSON)
    pub sentences: BTreeMap<usize, SentenceEntry>,
    pub paragraphs: Map<String, Value>,
    pub dependencies: Vec<DependencyBlock>,
    pub coreferences: Vec<CoreferenceEntry>,
    pub constituents: Vec<ConstituentEntry>,
    pub expressions: Vec<Expression>,
}

impl Document {
    /// Token pelo id 1-based
    pub fn token(&self, id: usize) -> Option<&TokenEntry> {
        id.checked_sub(1).and_then(|i| self.token_list.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub id: usize,
    pub sentence_id: usize,
    pub text: String,
    pub lemma: String,
    pub xpos: String,
    pub upos: String,
    pub entity_iob: String,
    #[serde(rename = "characterOffsetBegin")]
    pub character_offset_begin: usize,
    #[serde(rename = "characterOffsetEnd")]
    pub character_offset_end: usize,
    pub lang: String,
    /// `Overt`, `Stop`, `Alpha` e os traços morfológicos da tag
    pub features: Map<String, Value>,
    pub misc: TokenMisc,
    pub shape: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMisc {
    #[serde(rename = "SpaceAfter")]
    pub space_after: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceEntry {
    pub id: usize,
    #[serde(rename = "tokenFrom")]
    pub token_from: usize,
    /// Primeiro id depois da sentença (exclusivo)
    #[serde(rename = "tokenTo")]
    pub token_to: usize,
    pub tokens: Vec<usize>,
}

/// Árvore de dependências de uma sentença.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyBlock {
    pub style: String,
    pub trees: Vec<DependencyArc>,
}

/// Arco de dependência; `gov == 0` é a raiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyArc {
    pub lab: String,
    pub gov: usize,
    pub dep: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreferenceEntry {
    pub id: usize,
    pub representative: Mention,
    pub referents: Vec<Mention>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub tokens: Vec<usize>,
    /// `null` quando o núcleo não é único
    pub head: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituentEntry {
    #[serde(rename = "sentenceId")]
    pub sentence_id: usize,
    #[serde(rename = "labeledBracketing")]
    pub labeled_bracketing: String,
}

/// Sintagma nominal com mais de um token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub head: usize,
    pub dependency: String,
    pub tokens: Vec<usize>,
}

/// Quadro JSON-NLP vazio (sem documentos).
pub fn get_base() -> JsonNlp {
    JsonNlp {
        meta: Meta::new(),
        conll: Map::new(),
        documents: Vec::new(),
    }
}

/// Documento vazio com o id dado.
pub fn base_document(id: usize) -> Document {
    Document {
        meta: Meta::new(),
        id,
        conll_id: String::new(),
        text: String::new(),
        token_list: Vec::new(),
        sentences: BTreeMap::new(),
        paragraphs: Map::new(),
        dependencies: Vec::new(),
        coreferences: Vec::new(),
        constituents: Vec::new(),
        expressions: Vec::new(),
    }
}

/// Quadro de uma cadeia de correferência, ainda sem menções.
pub fn build_coreference(id: usize) -> CoreferenceEntry {
    CoreferenceEntry {
        id,
        representative: Mention { tokens: Vec::new(), head: None },
        referents: Vec::new(),
    }
}

/// Remove campos vazios (`""`, `[]`, `{}`) da raiz, do `meta` da raiz e de cada
/// documento, incluindo o `meta` de cada documento.
///
/// Os blocos internos são limpos antes de o pai decidir se estão vazios, então
/// aplicar a função duas vezes dá o mesmo resultado.
pub fn remove_empty_fields(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(prune_object(map)),
        other => other,
    }
}

fn prune_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let value = match (key.as_str(), value) {
                ("meta", Value::Object(meta)) => Value::Object(prune_object(meta)),
                ("documents", Value::Array(docs)) => {
                    Value::Array(docs.into_iter().map(remove_empty_fields).collect())
                }
                (_, value) => value,
            };
            (key, value)
        })
        .filter(|(_, value)| !is_empty_value(value))
        .collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Reconstrói o texto de superfície a partir dos tokens, usando `misc.SpaceAfter`.
pub fn surface_string(tokens: &[TokenEntry], trim: bool) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&token.text);
        if token.misc.space_after {
            out.push(' ');
        }
    }
    if trim {
        out.truncate(out.trim_end().len());
    }
    out
}

/// Tokens de `a` cujos ids não aparecem em `b`, na ordem de `a`.
pub fn subtract_tokens(a: &[TokenEntry], b: &[TokenEntry]) -> Vec<TokenEntry> {
    let exclude: HashSet<usize> = b.iter().map(|t| t.id).collect();
    a.iter().filter(|t| !exclude.contains(&t.id)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(id: usize, text: &str, space_after: bool) -> TokenEntry {
        TokenEntry {
            id,
            sentence_id: 1,
            text: text.to_string(),
            lemma: text.to_lowercase(),
            xpos: "NN".to_string(),
            upos: "NOUN".to_string(),
            entity_iob: "O".to_string(),
            character_offset_begin: 0,
            character_offset_end: text.chars().count(),
            lang: "en".to_string(),
            features: Map::new(),
            misc: TokenMisc { space_after },
            shape: "xxxx".to_string(),
            entity: None,
        }
    }

    #[test]
    fn test_base_document_shape() {
        let value = serde_json::to_value(base_document(1)).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "meta", "id", "conllId", "text", "tokenList", "sentences", "paragraphs",
                "dependencies", "coreferences", "constituents", "expressions",
            ]
        );
        assert_eq!(value["meta"]["DC.conformsTo"], "1.0");
        assert_eq!(value["meta"]["DC.created"].as_str().unwrap().len(), 19);
    }

    #[test]
    fn test_remove_empty_fields() {
        let mut base = get_base();
        let mut doc = base_document(1);
        doc.text = "Hi".to_string();
        doc.meta.source = "jsonnlp-core".to_string();
        base.documents.push(doc);

        let value = remove_empty_fields(serde_json::to_value(&base).unwrap());
        let root = value.as_object().unwrap();
        assert!(!root.contains_key("conll"));
        assert!(!root["meta"].as_object().unwrap().contains_key("DC.source"));
        assert!(!root["meta"].as_object().unwrap().contains_key("counts"));

        let doc = &value["documents"][0];
        assert_eq!(doc["text"], "Hi");
        assert_eq!(doc["meta"]["DC.source"], "jsonnlp-core");
        assert!(doc.get("tokenList").is_none());
        assert!(doc.get("conllId").is_none());
        assert!(doc["meta"].get("DC.title").is_none());
    }

    #[test]
    fn test_remove_empty_fields_is_idempotent() {
        let value = json!({
            "meta": {"DC.source": "", "counts": {}},
            "documents": [{"meta": {"DC.title": ""}, "id": 1, "flag": false, "none": null}],
        });
        let once = remove_empty_fields(value);
        let twice = remove_empty_fields(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once, json!({"documents": [{"id": 1, "flag": false, "none": null}]}));
    }

    #[test]
    fn test_surface_string() {
        let tokens = vec![token(1, "Hello", false), token(2, ",", true), token(3, "world", true)];
        assert_eq!(surface_string(&tokens, false), "Hello, world ");
        assert_eq!(surface_string(&tokens, true), "Hello, world");
    }

    #[test]
    fn test_subtract_tokens() {
        let a = vec![token(1, "a", true), token(2, "b", true), token(3, "c", false)];
        let b = vec![token(2, "b", true)];
        let ids: Vec<usize> = subtract_tokens(&a, &b).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_build_coreference_frame() {
        let value = serde_json::to_value(build_coreference(3)).unwrap();
        assert_eq!(value, json!({"id": 3, "representative": {"tokens": [], "head": null}, "referents": []}));
    }
}
