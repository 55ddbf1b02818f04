//! Núcleo sintático de um grupo de tokens.

use std::collections::BTreeSet;

use crate::jsonnlp::Document;

/// Encontra o núcleo de um grupo de tokens (sintagma, oração, menção).
///
/// Parte do conjunto de ids e remove todo token que é dependente de outro token
/// do mesmo conjunto, segundo os arcos da sentença `sentence_id`. O que sobra é
/// o núcleo. Grupo vazio, sentença sem dependências e sobra de zero ou de mais de
/// um candidato dão `None`.
///
/// Um arco conta quando as duas pontas estão no grupo original, não só entre os
/// candidatos restantes, então a ordem dos arcos não muda o resultado.
pub fn find_head(document: &Document, token_ids: &[usize], sentence_id: usize) -> Option<usize> {
    if token_ids.is_empty() {
        return None;
    }
    let arcs = &document.dependencies.get(sentence_id.checked_sub(1)?)?.trees;

    let mut candidates: BTreeSet<usize> = token_ids.iter().copied().collect();
    for arc in arcs {
        if token_ids.contains(&arc.gov) && token_ids.contains(&arc.dep) {
            candidates.remove(&arc.dep);
        }
    }

    let mut remaining = candidates.into_iter();
    match (remaining.next(), remaining.next()) {
        (Some(head), None) => Some(head),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonnlp::{base_document, DependencyArc, DependencyBlock};

    fn arc(lab: &str, gov: usize, dep: usize) -> DependencyArc {
        DependencyArc { lab: lab.to_string(), gov, dep }
    }

    /// "the big dog barked": 1 → 3, 2 → 3, 3 → 4, 4 raiz
    fn document() -> Document {
        let mut doc = base_document(1);
        doc.dependencies.push(DependencyBlock {
            style: "universal".to_string(),
            trees: vec![arc("det", 3, 1), arc("amod", 3, 2), arc("nsubj", 4, 3), arc("root", 0, 4)],
        });
        doc
    }

    #[test]
    fn test_head_of_phrase() {
        let doc = document();
        assert_eq!(find_head(&doc, &[1, 2, 3], 1), Some(3));
        assert_eq!(find_head(&doc, &[1, 2, 3, 4], 1), Some(4));
        assert_eq!(find_head(&doc, &[2], 1), Some(2));
    }

    #[test]
    fn test_no_single_head() {
        let doc = document();
        // dois tokens sem arco entre si
        assert_eq!(find_head(&doc, &[1, 2], 1), None);
        assert_eq!(find_head(&doc, &[], 1), None);
        assert_eq!(find_head(&doc, &[1, 2, 3], 2), None);
        assert_eq!(find_head(&doc, &[1, 2, 3], 0), None);
    }

    #[test]
    fn test_chain_head_ignores_arc_order() {
        // "very big dogs": 1 → 2 → 3, com o arco 3 → 2 listado antes de 2 → 1
        let mut doc = base_document(1);
        doc.dependencies.push(DependencyBlock {
            style: "universal".to_string(),
            trees: vec![arc("amod", 3, 2), arc("advmod", 2, 1), arc("root", 0, 3)],
        });
        assert_eq!(find_head(&doc, &[1, 2, 3], 1), Some(3));
        assert_eq!(find_head(&doc, &[3, 2, 1], 1), Some(3));
        assert_eq!(find_head(&doc, &[1, 2], 1), Some(2));
    }
}
