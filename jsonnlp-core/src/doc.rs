//! # Documento do Pipeline
//!
//! O [`Doc`] é a representação nativa do pipeline: cada estágio recebe o documento
//! e preenche a sua parte (tags, árvore de dependências, entidades, correferência,
//! árvores de constituintes). O montador JSON-NLP só lê o `Doc` pronto.
//!
//! Índices de token aqui são sempre **posições no documento** (0, 1, 2...), nunca
//! os IDs 1-based do JSON-NLP; a tradução é feita no montador.

use std::ops::Range;

use serde::Serialize;

use crate::entity::{EntIob, EntityLabel, EntitySpan};
use crate::error::NlpError;
use crate::lexicon::Upos;
use crate::parser::DepLabel;
use crate::tokenizer::Token;

/// Token com todas as anotações do pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedToken {
    /// Token original (texto e offsets)
    pub token: Token,
    /// Tag Penn Treebank (ex: "NNS", "VBZ")
    pub tag: String,
    /// Classe gramatical universal
    pub pos: Upos,
    pub lemma: String,
    /// Rótulo da relação com o núcleo
    pub dep: DepLabel,
    /// Posição do núcleo no documento; a raiz aponta para si mesma
    pub head: usize,
    pub ent_iob: EntIob,
    pub ent_type: Option<EntityLabel>,
    pub is_stop: bool,
    pub is_alpha: bool,
    /// Forma ortográfica no estilo "Xxxxx", "dd.d"
    pub shape: String,
}

impl AnalyzedToken {
    /// Token ainda não anotado: sem tag, núcleo em si mesmo, fora de entidade.
    pub fn new(token: Token) -> Self {
        let index = token.index;
        let lemma = token.text.clone();
        Self {
            token,
            tag: String::new(),
            pos: Upos::X,
            lemma,
            dep: DepLabel::Dep,
            head: index,
            ent_iob: EntIob::Outside,
            ent_type: None,
            is_stop: false,
            is_alpha: false,
            shape: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.token.text
    }

    pub fn index(&self) -> usize {
        self.token.index
    }
}

/// Um sintagma nominal: intervalo de tokens e o token núcleo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NounChunk {
    pub span: Range<usize>,
    pub root: usize,
}

impl NounChunk {
    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Um grupo de menções que se referem à mesma entidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorefCluster {
    /// Menção principal (a mais informativa)
    pub main: Range<usize>,
    /// Todas as menções em ordem de aparição, incluindo a principal
    pub mentions: Vec<Range<usize>>,
}

/// Documento processado pelo pipeline.
#[derive(Debug)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<AnalyzedToken>,
    /// Sentenças como intervalos de posições de token
    pub sents: Vec<Range<usize>>,
    pub ents: Vec<EntitySpan>,
    /// `None` quando o estágio de correferência não está no pipeline
    pub coref_clusters: Option<Vec<CorefCluster>>,
    /// Uma árvore de constituintes por sentença; `None` sem o estágio de constituintes
    pub parses: Option<Vec<Result<String, NlpError>>>,
}

impl Doc {
    pub fn new(text: &str, tokens: Vec<Token>, sents: Vec<Range<usize>>) -> Self {
        Self {
            text: text.to_string(),
            tokens: tokens.into_iter().map(AnalyzedToken::new).collect(),
            sents,
            ents: Vec::new(),
            coref_clusters: None,
            parses: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Índice da sentença que contém o token `i`
    pub fn sent_of(&self, i: usize) -> Option<usize> {
        self.sents.iter().position(|range| range.contains(&i))
    }

    /// Offset (em caracteres) do fim da sentença
    pub fn sent_end_char(&self, sent: usize) -> Option<usize> {
        let range = self.sents.get(sent)?;
        let last = range.end.checked_sub(1)?;
        self.tokens.get(last).map(|t| t.token.char_end)
    }

    /// Filhos diretos de um token na árvore de dependências
    pub fn children(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        let range = self.sent_of(i).map(|s| self.sents[s].clone()).unwrap_or(0..0);
        range.filter(move |&j| j != i && self.tokens[j].head == i)
    }

    /// Token mais à esquerda da subárvore de `i`
    pub fn left_edge(&self, i: usize) -> usize {
        self.subtree(i).into_iter().min().unwrap_or(i)
    }

    /// Todos os tokens da subárvore de `i` (incluindo `i`), em ordem
    pub fn subtree(&self, i: usize) -> Vec<usize> {
        let mut nodes = vec![i];
        let mut stack = vec![i];
        while let Some(node) = stack.pop() {
            for child in self.children(node) {
                if !nodes.contains(&child) {
                    nodes.push(child);
                    stack.push(child);
                }
            }
        }
        nodes.sort_unstable();
        nodes
    }

    /// Sintagmas nominais do inglês.
    ///
    /// Um token nominal (substantivo, nome próprio, pronome) abre um sintagma se o seu
    /// rótulo for de argumento (`nsubj`, `dobj`, `pobj`...) ou se for `conj` de um
    /// token que o seja. O sintagma vai da borda esquerda da subárvore até o token;
    /// sintagmas que se sobrepõem ao anterior são descartados.
    pub fn noun_chunks(&self) -> Vec<NounChunk> {
        let mut chunks = Vec::new();
        let mut prev_end: Option<usize> = None;

        for (i, token) in self.tokens.iter().enumerate() {
            if !token.pos.is_nominal() {
                continue;
            }
            let left = self.left_edge(i);
            if prev_end.is_some_and(|end| left <= end) {
                continue;
            }
            let accepted = if token.dep.is_noun_phrase() {
                true
            } else if token.dep == DepLabel::Conj {
                // sobe pela cadeia de conjunções até o primeiro conjunto
                let mut head = token.head;
                while self.tokens[head].dep == DepLabel::Conj && self.tokens[head].head < head {
                    head = self.tokens[head].head;
                }
                self.tokens[head].dep.is_noun_phrase()
            } else {
                false
            };
            if accepted {
                prev_end = Some(i);
                chunks.push(NounChunk { span: left..i + 1, root: i });
            }
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{split_sentences, tokenize};

    /// "the big dog barked" com árvore montada à mão
    fn toy_doc() -> Doc {
        let text = "the big dog barked";
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        let arcs = [
            (2, DepLabel::Det, Upos::Det),
            (2, DepLabel::Amod, Upos::Adj),
            (3, DepLabel::Nsubj, Upos::Noun),
            (3, DepLabel::Root, Upos::Verb),
        ];
        for (token, (head, dep, pos)) in doc.tokens.iter_mut().zip(arcs) {
            token.head = head;
            token.dep = dep;
            token.pos = pos;
        }
        doc
    }

    #[test]
    fn test_children_and_left_edge() {
        let doc = toy_doc();
        assert_eq!(doc.children(2).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(doc.left_edge(2), 0);
        assert_eq!(doc.subtree(3), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_noun_chunks() {
        let doc = toy_doc();
        let chunks = doc.noun_chunks();
        assert_eq!(chunks, vec![NounChunk { span: 0..3, root: 2 }]);
    }

    #[test]
    fn test_sent_end_char() {
        let doc = toy_doc();
        assert_eq!(doc.sent_end_char(0), Some(18));
        assert_eq!(doc.sent_end_char(1), None);
        assert_eq!(doc.sent_of(3), Some(0));
    }
}
