//! # jsonnlp-core: Pipeline NLP com Saída JSON-NLP
//!
//! Este crate processa textos em inglês e normaliza todas as anotações
//! linguísticas num único documento JSON-NLP, com ids inteiros estáveis e
//! referências cruzadas entre tokens, sentenças, dependências, correferências,
//! árvores de constituintes e sintagmas nominais.
//!
//! ## Arquitetura do Sistema
//!
//! O texto passa por um pipeline linear e depois pelo montador:
//!
//! 1.  **Tokenização** ([`tokenizer`]): tokens com offsets em bytes e em caracteres, sentenças.
//! 2.  **Etiquetagem** ([`tagger`], [`lexicon`]): tags Penn, classe universal, lema, forma.
//! 3.  **Dependências** ([`parser`]): uma árvore por sentença, em paralelo com `rayon`.
//! 4.  **Entidades** ([`entity`]): gazetteers, padrões e regex em esquema BIO.
//! 5.  **Correferência** ([`coref`]) e **constituintes** ([`constituency`]), opcionais.
//! 6.  **Montagem** ([`assembler`]): o [`Doc`] vira o documento [`jsonnlp`].
//!
//! O [`ModelCache`] guarda os pipelines já carregados e é compartilhado pelo servidor.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use jsonnlp_core::{process, BuiltinLoader, ModelCache, ProcessOptions};
//!
//! // 1. Cache com o carregador dos modelos embutidos
//! let cache = ModelCache::new(Arc::new(BuiltinLoader));
//!
//! // 2. Pipeline com correferência e constituintes
//! let nlp = cache.get_or_load("en_core_web_sm", true, true).unwrap();
//!
//! // 3. Documento JSON-NLP, sem campos vazios
//! let json = process(&nlp, "John Smith arrived. He was tired.", &ProcessOptions::default())
//!     .unwrap()
//!     .into_value()
//!     .unwrap();
//! assert_eq!(json["documents"][0]["tokenList"].as_array().unwrap().len(), 8);
//! ```

pub mod assembler;
pub mod cache;
pub mod constituency;
pub mod coref;
pub mod doc;
pub mod entity;
pub mod error;
pub mod head;
pub mod jsonnlp;
pub mod lexicon;
pub mod parser;
pub mod pipeline;
pub mod tagger;
pub mod tokenizer;

pub use assembler::{process, Assembly, ConstituentOutcome, ProcessOptions, SkipReason};
pub use cache::ModelCache;
pub use doc::Doc;
pub use error::{NlpError, Result};
pub use head::find_head;
pub use jsonnlp::{remove_empty_fields, subtract_tokens, surface_string};
pub use pipeline::{BuiltinLoader, Language, ModelId, ModelLoader, PipelineConfig, Stage};
pub use tokenizer::Token;
