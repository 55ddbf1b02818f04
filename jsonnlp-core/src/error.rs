//! # Erros do pipeline JSON-NLP
//!
//! Um único enum cobre as falhas do crate: carregamento de modelos,
//! montagem do documento e serialização.

/// Erros produzidos pelo pipeline, pelo cache de modelos ou pelo montador.
#[derive(Debug, thiserror::Error)]
pub enum NlpError {
    /// O nome pedido não corresponde a nenhum modelo conhecido.
    #[error("modelo desconhecido: {0}")]
    UnknownModel(String),

    /// O carregador falhou ao construir o modelo.
    #[error("falha ao carregar o modelo {name}: {reason}")]
    ModelLoad { name: String, reason: String },

    /// Uma referência do pipeline não tem token correspondente no documento.
    #[error("token não resolvido: sentença {sentence}, índice {index}")]
    UnresolvedToken { sentence: usize, index: usize },

    /// A árvore de dependências da sentença tem arcos cruzados e não vira
    /// uma árvore de constituintes.
    #[error("árvore não projetiva na sentença {sentence}")]
    NonProjective { sentence: usize },

    /// Falha ao converter o documento em JSON.
    #[error("erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NlpError {
    pub fn model_load(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Alias usado em todo o crate.
pub type Result<T> = std::result::Result<T, NlpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NlpError::UnknownModel("de_core_news_sm".into());
        assert_eq!(err.to_string(), "modelo desconhecido: de_core_news_sm");

        let err = NlpError::model_load("en_core_web_sm", "léxico vazio");
        assert!(err.to_string().contains("léxico vazio"));
    }
}
