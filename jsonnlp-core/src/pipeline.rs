//! # Pipeline: Modelo Carregado e Estágios
//!
//! Um [`Language`] é o pipeline pronto para uso: o modelo escolhido, o léxico,
//! o reconhecedor de entidades e a lista **fixa** de estágios, decidida uma única
//! vez a partir do [`PipelineConfig`]:
//!
//! ```text
//! Tokenizer → Tagger → Parser → EntityRecognizer [→ Coreference] [→ Constituency]
//! ```
//!
//! Depois de carregado o `Language` só é lido, então pode ser compartilhado
//! entre requisições (`Arc<Language>`) sem trava.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use jsonnlp_core::pipeline::{Language, PipelineConfig};
//!
//! let config = PipelineConfig::new("en_core_web_sm", true, false);
//! let nlp = Language::load(&config).unwrap();
//! let doc = nlp.process("John Smith arrived. He was tired.");
//! assert_eq!(doc.sents.len(), 2);
//! assert!(doc.coref_clusters.is_some());
//! assert!(doc.parses.is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::doc::Doc;
use crate::entity::EntityRecognizer;
use crate::error::{NlpError, Result};
use crate::lexicon::Lexicon;
use crate::tokenizer::{split_sentences, tokenize};
use crate::{constituency, coref, parser, tagger};

/// Modelos conhecidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// Pipeline de regras para inglês
    EnCoreWebSm,
}

impl ModelId {
    /// Modelo usado quando o nome pedido não existe
    pub const DEFAULT: ModelId = ModelId::EnCoreWebSm;

    /// Resolve um nome de modelo; `"en"` é atalho para `en_core_web_sm`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "en" | "en_core_web_sm" => Ok(ModelId::EnCoreWebSm),
            other => Err(NlpError::UnknownModel(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelId::EnCoreWebSm => "en_core_web_sm",
        }
    }

    /// Código de idioma do modelo (vai em `lang` e `DC.language`)
    pub fn lang(&self) -> &'static str {
        match self {
            ModelId::EnCoreWebSm => "en",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argumentos de carga de um pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub model: String,
    pub with_coref: bool,
    pub with_constituents: bool,
}

impl PipelineConfig {
    pub fn new(model: impl Into<String>, with_coref: bool, with_constituents: bool) -> Self {
        Self {
            model: model.into(),
            with_coref,
            with_constituents,
        }
    }

    /// Estágios na ordem de execução
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Tokenizer, Stage::Tagger, Stage::Parser, Stage::EntityRecognizer];
        if self.with_coref {
            stages.push(Stage::Coreference);
        }
        if self.with_constituents {
            stages.push(Stage::Constituency);
        }
        stages
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(ModelId::DEFAULT.name(), true, true)
    }
}

/// Um estágio do pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Tokenizer,
    Tagger,
    Parser,
    EntityRecognizer,
    Coreference,
    Constituency,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Tokenizer => "tokenizer",
            Stage::Tagger => "tagger",
            Stage::Parser => "parser",
            Stage::EntityRecognizer => "ner",
            Stage::Coreference => "coref",
            Stage::Constituency => "constituency",
        }
    }

    fn apply(&self, language: &Language, doc: &mut Doc) {
        match self {
            Stage::Tokenizer => {
                let tokens = tokenize(&doc.text);
                let sents = split_sentences(&doc.text, &tokens);
                *doc = Doc::new(&doc.text, tokens, sents);
            }
            Stage::Tagger => tagger::tag(doc, &language.lexicon),
            Stage::Parser => parser::parse(doc),
            Stage::EntityRecognizer => language.recognizer.recognize(doc),
            Stage::Coreference => coref::resolve(doc),
            Stage::Constituency => constituency::parse(doc),
        }
    }
}

/// Pipeline carregado.
pub struct Language {
    model: ModelId,
    stages: Vec<Stage>,
    lexicon: Lexicon,
    recognizer: EntityRecognizer,
}

impl Language {
    /// Carrega o pipeline pedido. Um nome desconhecido é erro.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let model = ModelId::from_name(&config.model)?;
        let lexicon = Lexicon::english();
        if lexicon.is_empty() {
            return Err(NlpError::model_load(model.name(), "léxico vazio"));
        }
        let stages = config.stages();
        info!(
            model = model.name(),
            stages = ?stages.iter().map(Stage::name).collect::<Vec<_>>(),
            "pipeline carregado"
        );
        Ok(Self {
            model,
            stages,
            lexicon,
            recognizer: EntityRecognizer::english(),
        })
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Executa todos os estágios sobre o texto.
    pub fn process(&self, text: &str) -> Doc {
        let mut doc = Doc::new(text, Vec::new(), Vec::new());
        for stage in &self.stages {
            stage.apply(self, &mut doc);
        }
        debug!(tokens = doc.len(), sentences = doc.sents.len(), "documento processado");
        doc
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("model", &self.model)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

/// Fonte de pipelines carregados; o cache de modelos recebe uma implementação.
pub trait ModelLoader: Send + Sync {
    fn load(&self, config: &PipelineConfig) -> Result<Language>;
}

/// Carregador dos modelos embutidos.
///
/// Um nome desconhecido não derruba a requisição: o modelo padrão é carregado
/// no lugar, com um aviso no log.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

impl ModelLoader for BuiltinLoader {
    fn load(&self, config: &PipelineConfig) -> Result<Language> {
        match Language::load(config) {
            Err(NlpError::UnknownModel(name)) => {
                warn!(requested = %name, fallback = ModelId::DEFAULT.name(), "modelo desconhecido, usando o padrão");
                let fallback = PipelineConfig {
                    model: ModelId::DEFAULT.name().to_string(),
                    ..config.clone()
                };
                Language::load(&fallback)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names() {
        assert_eq!(ModelId::from_name("en").unwrap(), ModelId::EnCoreWebSm);
        assert_eq!(ModelId::from_name("en_core_web_sm").unwrap().lang(), "en");
        assert!(matches!(
            ModelId::from_name("de_core_news_sm"),
            Err(NlpError::UnknownModel(name)) if name == "de_core_news_sm"
        ));
    }

    #[test]
    fn test_stage_order() {
        let all = PipelineConfig::new("en", true, true).stages();
        assert_eq!(
            all,
            vec![
                Stage::Tokenizer,
                Stage::Tagger,
                Stage::Parser,
                Stage::EntityRecognizer,
                Stage::Coreference,
                Stage::Constituency,
            ]
        );
        let bare = PipelineConfig::new("en", false, false).stages();
        assert_eq!(bare.len(), 4);
        assert!(!bare.contains(&Stage::Coreference));
    }

    #[test]
    fn test_process_fills_doc() {
        let nlp = Language::load(&PipelineConfig::default()).unwrap();
        let doc = nlp.process("The dog chased the cat. It ran away.");
        assert_eq!(doc.len(), 10);
        assert_eq!(doc.sents, vec![0..6, 6..10]);
        assert!(doc.tokens.iter().all(|t| !t.tag.is_empty()));
        assert_eq!(doc.parses.as_ref().map(Vec::len), Some(2));
        assert!(doc.coref_clusters.is_some());
    }

    #[test]
    fn test_optional_stages_are_skipped() {
        let nlp = Language::load(&PipelineConfig::new("en", false, false)).unwrap();
        let doc = nlp.process("The dog barked.");
        assert!(doc.coref_clusters.is_none());
        assert!(doc.parses.is_none());
        assert!(!nlp.has_stage(Stage::Constituency));
    }

    #[test]
    fn test_empty_text() {
        let nlp = Language::load(&PipelineConfig::default()).unwrap();
        let doc = nlp.process("");
        assert!(doc.is_empty());
        assert!(doc.sents.is_empty());
    }

    #[test]
    fn test_builtin_loader_falls_back() {
        let language = BuiltinLoader.load(&PipelineConfig::new("xx_unknown", false, true)).unwrap();
        assert_eq!(language.model(), ModelId::EnCoreWebSm);
        assert!(language.has_stage(Stage::Constituency));
        assert!(Language::load(&PipelineConfig::new("xx_unknown", false, true)).is_err());
    }
}
