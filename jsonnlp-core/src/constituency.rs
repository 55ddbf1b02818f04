//! # Árvores de Constituintes
//!
//! Converte a árvore de dependências de cada sentença numa árvore de
//! constituintes no formato Penn Treebank:
//!
//! ```text
//! (S (NP (DT The) (NN dog)) (VP (VBD chased) (NP (DT the) (NN cat))) (. .))
//! ```
//!
//! A projeção segue a classe do núcleo: nomes formam `NP`, preposições `PP`,
//! adjetivos `ADJP`, advérbios `ADVP`. Um núcleo com sujeito vira uma oração
//! `S` com o sujeito à esquerda do `VP`; uma oração com conjunção subordinativa
//! (`mark`) fica dentro de um `SBAR`.
//!
//! Só árvores projetivas (sem arcos cruzados) têm projeção; as demais geram
//! [`NlpError::NonProjective`] apenas para a sentença afetada.

use std::ops::Range;

use tracing::debug;

use crate::doc::Doc;
use crate::error::{NlpError, Result};
use crate::lexicon::Upos;
use crate::parser::DepLabel;

/// Nó da árvore de constituintes
#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// Token: posição no documento
    Leaf(usize),
    Phrase(&'static str, Vec<Node>),
}

impl Node {
    fn label(&self) -> Option<&'static str> {
        match self {
            Node::Leaf(_) => None,
            Node::Phrase(label, _) => Some(*label),
        }
    }

    fn render(&self, doc: &Doc, out: &mut String) {
        match self {
            Node::Leaf(i) => {
                let token = &doc.tokens[*i];
                let tag = if token.tag.is_empty() { "XX" } else { token.tag.as_str() };
                out.push('(');
                out.push_str(&escape(tag));
                out.push(' ');
                out.push_str(&escape(token.text()));
                out.push(')');
            }
            Node::Phrase(label, children) => {
                out.push('(');
                out.push_str(label);
                for child in children {
                    out.push(' ');
                    child.render(doc, out);
                }
                out.push(')');
            }
        }
    }
}

/// Parênteses no texto viram `-LRB-`/`-RRB-` para não quebrar a estrutura
fn escape(text: &str) -> String {
    text.replace('(', "-LRB-").replace(')', "-RRB-")
}

/// Gera a árvore de constituintes de todas as sentenças do documento.
pub fn parse(doc: &mut Doc) {
    let parses: Vec<Result<String>> = (0..doc.sents.len()).map(|s| bracket_sentence(doc, s)).collect();
    let failed = parses.iter().filter(|p| p.is_err()).count();
    if failed > 0 {
        debug!(failed, "sentenças sem árvore de constituintes");
    }
    doc.parses = Some(parses);
}

/// Árvore de constituintes de uma sentença (índice 0-based no documento).
///
/// O número de sentença nos erros é 1-based, como no JSON-NLP.
pub fn bracket_sentence(doc: &Doc, sentence: usize) -> Result<String> {
    let range = doc
        .sents
        .get(sentence)
        .cloned()
        .ok_or(NlpError::UnresolvedToken { sentence: sentence + 1, index: 0 })?;

    if !is_projective(doc, &range) {
        return Err(NlpError::NonProjective { sentence: sentence + 1 });
    }

    let roots: Vec<usize> = range.clone().filter(|&i| doc.tokens[i].head == i).collect();
    let node = match roots.as_slice() {
        [root] => {
            let node = build(doc, *root);
            let nominal = doc.tokens[*root].pos.is_nominal();
            if (nominal || node.label().is_none()) && node.label() != Some("NP") {
                // fragmento sem verbo
                Node::Phrase("FRAG", vec![node])
            } else {
                node
            }
        }
        _ => Node::Phrase("FRAG", roots.iter().map(|&r| build(doc, r)).collect()),
    };

    let mut out = String::new();
    node.render(doc, &mut out);
    Ok(out)
}

/// Todo token entre um núcleo e o seu dependente precisa estar na subárvore do núcleo
fn is_projective(doc: &Doc, range: &Range<usize>) -> bool {
    range.clone().all(|dep| {
        let head = doc.tokens[dep].head;
        if head == dep {
            return true;
        }
        let (lo, hi) = if head < dep { (head, dep) } else { (dep, head) };
        (lo + 1..hi).all(|k| dominates(doc, range, head, k))
    })
}

fn dominates(doc: &Doc, range: &Range<usize>, ancestor: usize, mut node: usize) -> bool {
    for _ in 0..range.len() {
        if node == ancestor {
            return true;
        }
        let head = doc.tokens[node].head;
        if head == node || !range.contains(&head) {
            return false;
        }
        node = head;
    }
    node == ancestor
}

fn is_subject(dep: DepLabel) -> bool {
    matches!(dep, DepLabel::Nsubj | DepLabel::Nsubjpass | DepLabel::Expl)
}

/// Constrói o constituinte encabeçado pelo token `i`
fn build(doc: &Doc, i: usize) -> Node {
    let token = &doc.tokens[i];
    let children: Vec<usize> = doc.children(i).collect();

    if children.iter().any(|&c| is_subject(doc.tokens[c].dep)) {
        return clause(doc, i, &children);
    }
    if children.is_empty() {
        return leaf_phrase(doc, i);
    }

    let (left, right): (Vec<usize>, Vec<usize>) = children.iter().partition(|&&c| c < i);
    match token.pos {
        Upos::Noun | Upos::Propn | Upos::Pron => {
            let mut core: Vec<Node> = left.iter().map(|&c| build(doc, c)).collect();
            core.push(Node::Leaf(i));
            if right.is_empty() {
                Node::Phrase("NP", core)
            } else {
                let mut nodes = vec![Node::Phrase("NP", core)];
                nodes.extend(right.iter().map(|&c| build(doc, c)));
                Node::Phrase("NP", nodes)
            }
        }
        Upos::Verb | Upos::Aux => {
            let vp = verb_phrase(doc, i, &children);
            if token.head == i {
                Node::Phrase("S", vec![vp])
            } else {
                vp
            }
        }
        pos => Node::Phrase(phrase_label(pos), span_nodes(doc, i, &children)),
    }
}

/// Oração com sujeito: `(S sujeito (VP ...))`, dentro de `SBAR` quando há `mark`
fn clause(doc: &Doc, i: usize, children: &[usize]) -> Node {
    // sujeito posposto ("said he") fica dentro do VP
    let split = children
        .iter()
        .rposition(|&c| c < i && is_subject(doc.tokens[c].dep))
        .map_or(0, |p| p + 1);
    let marks: Vec<usize> = children
        .iter()
        .copied()
        .filter(|&c| c < i && doc.tokens[c].dep == DepLabel::Mark)
        .collect();
    let trailing_punct: Vec<usize> = children
        .iter()
        .rev()
        .take_while(|&&c| c > i && doc.tokens[c].dep == DepLabel::Punct)
        .copied()
        .collect();

    let mut s_nodes: Vec<Node> = Vec::new();
    for &c in &children[..split] {
        if !marks.contains(&c) {
            s_nodes.push(build(doc, c));
        }
    }
    let predicate: Vec<usize> = children[split..]
        .iter()
        .copied()
        .filter(|c| !marks.contains(c) && !trailing_punct.contains(c))
        .collect();
    s_nodes.push(verb_phrase(doc, i, &predicate));
    for &c in trailing_punct.iter().rev() {
        s_nodes.push(build(doc, c));
    }

    let s = Node::Phrase("S", s_nodes);
    if marks.is_empty() {
        s
    } else {
        let mut nodes: Vec<Node> = marks.iter().map(|&m| build(doc, m)).collect();
        nodes.push(s);
        Node::Phrase("SBAR", nodes)
    }
}

/// Predicado: o núcleo com os dependentes dados, rotulado pela classe do núcleo
fn verb_phrase(doc: &Doc, i: usize, children: &[usize]) -> Node {
    let label = match doc.tokens[i].pos {
        Upos::Noun | Upos::Propn | Upos::Pron | Upos::Num => "NP",
        Upos::Adj => "ADJP",
        _ => "VP",
    };
    let nodes = span_nodes(doc, i, children);
    if label == "VP" {
        Node::Phrase("VP", nodes)
    } else {
        // predicado nominal sem cópula explícita
        Node::Phrase("VP", vec![Node::Phrase(label, nodes)])
    }
}

/// Dependentes à esquerda, o próprio núcleo e dependentes à direita, em ordem
fn span_nodes(doc: &Doc, i: usize, children: &[usize]) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(children.len() + 1);
    let mut placed = false;
    for &c in children {
        if c > i && !placed {
            nodes.push(Node::Leaf(i));
            placed = true;
        }
        nodes.push(build(doc, c));
    }
    if !placed {
        nodes.push(Node::Leaf(i));
    }
    nodes
}

/// Token sem dependentes: argumentos nominais ganham um `NP` próprio
fn leaf_phrase(doc: &Doc, i: usize) -> Node {
    let token = &doc.tokens[i];
    match token.pos {
        Upos::Noun | Upos::Propn | Upos::Pron => Node::Phrase("NP", vec![Node::Leaf(i)]),
        Upos::Verb | Upos::Aux if token.head == i => {
            Node::Phrase("S", vec![Node::Phrase("VP", vec![Node::Leaf(i)])])
        }
        Upos::Verb if matches!(token.dep, DepLabel::Xcomp | DepLabel::Ccomp | DepLabel::Conj | DepLabel::Advcl) => {
            Node::Phrase("VP", vec![Node::Leaf(i)])
        }
        Upos::Adj if matches!(token.dep, DepLabel::Acomp | DepLabel::Conj) => {
            Node::Phrase("ADJP", vec![Node::Leaf(i)])
        }
        Upos::Adv if token.dep == DepLabel::Advmod && doc.tokens[token.head].pos == Upos::Verb => {
            Node::Phrase("ADVP", vec![Node::Leaf(i)])
        }
        _ => Node::Leaf(i),
    }
}

fn phrase_label(pos: Upos) -> &'static str {
    match pos {
        Upos::Adj => "ADJP",
        Upos::Adv => "ADVP",
        Upos::Adp => "PP",
        Upos::Num => "QP",
        Upos::Part => "PRT",
        Upos::Intj => "INTJ",
        Upos::Det => "NP",
        Upos::Sconj => "SBAR",
        _ => "FRAG",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::tokenizer::{split_sentences, tokenize};
    use crate::{parser, tagger};

    fn parsed(text: &str) -> Doc {
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        tagger::tag(&mut doc, &Lexicon::english());
        parser::parse(&mut doc);
        doc
    }

    /// Parênteses balanceados e todos os tokens presentes, na ordem
    fn assert_well_formed(doc: &Doc, sentence: usize, bracketed: &str) {
        let mut depth = 0i32;
        for c in bracketed.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0, "{bracketed}");
        }
        assert_eq!(depth, 0, "{bracketed}");
        let mut rest = bracketed;
        for i in doc.sents[sentence].clone() {
            let leaf = format!(" {})", escape(doc.tokens[i].text()));
            let pos = rest.find(&leaf).unwrap_or_else(|| panic!("{leaf} em {bracketed}"));
            rest = &rest[pos + leaf.len()..];
        }
    }

    #[test]
    fn test_simple_clause() {
        let doc = parsed("The dog chased the cat.");
        let tree = bracket_sentence(&doc, 0).unwrap();
        assert_eq!(
            tree,
            "(S (NP (DT The) (NN dog)) (VP (VBD chased) (NP (DT the) (NN cat))) (. .))"
        );
    }

    #[test]
    fn test_every_sentence_is_well_formed() {
        let text = "Because he left, she cried. The man who left came back. Dogs (mostly) bark.";
        let mut doc = parsed(text);
        parse(&mut doc);
        let parses = doc.parses.as_ref().unwrap();
        assert_eq!(parses.len(), doc.sents.len());
        for (s, tree) in parses.iter().enumerate() {
            let tree = tree.as_ref().unwrap();
            assert!(tree.starts_with('('));
            assert_well_formed(&doc, s, tree);
        }
    }

    #[test]
    fn test_parentheses_are_escaped() {
        let doc = parsed("Dogs (mostly) bark.");
        let tree = bracket_sentence(&doc, 0).unwrap();
        assert!(tree.contains("(-LRB- -LRB-)"));
        assert!(tree.contains("(-RRB- -RRB-)"));
    }

    #[test]
    fn test_non_projective_sentence_fails() {
        let mut doc = parsed("a b c d");
        // 0 → 2 cruza 1 → 3
        let heads = [2, 3, 2, 2];
        for (token, head) in doc.tokens.iter_mut().zip(heads) {
            token.head = head;
        }
        let err = bracket_sentence(&doc, 0).unwrap_err();
        assert!(matches!(err, NlpError::NonProjective { sentence: 1 }));
    }

    #[test]
    fn test_fragment_without_verb() {
        let doc = parsed("A big red ball.");
        let tree = bracket_sentence(&doc, 0).unwrap();
        assert!(tree.starts_with("(NP ") || tree.starts_with("(FRAG "), "{tree}");
        assert_well_formed(&doc, 0, &tree);
    }

    #[test]
    fn test_parser_emits_every_label_used_in_projection() {
        let text = "The quick brown fox jumps over the lazy dog. He is sick. \
                    I want to go and she stayed. Because he left, she cried. \
                    There is a dog. The cake was eaten. He said that she left. He ran quickly.";
        let doc = parsed(text);
        let emitted: std::collections::HashSet<DepLabel> = doc.tokens.iter().map(|t| t.dep).collect();

        let used = [
            DepLabel::Nsubj,
            DepLabel::Nsubjpass,
            DepLabel::Expl,
            DepLabel::Mark,
            DepLabel::Punct,
            DepLabel::Xcomp,
            DepLabel::Ccomp,
            DepLabel::Conj,
            DepLabel::Advcl,
            DepLabel::Acomp,
            DepLabel::Advmod,
        ];
        for label in used {
            assert!(emitted.contains(&label), "{} nunca é produzido", label.as_str());
        }
        for s in 0..doc.sents.len() {
            let tree = bracket_sentence(&doc, s).unwrap();
            assert_well_formed(&doc, s, &tree);
        }
    }
}
