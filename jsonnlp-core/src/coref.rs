//! # Resolução de Correferência
//!
//! Agrupa menções que se referem à mesma entidade. As menções candidatas são:
//!
//! - sintagmas nominais (`Doc::noun_chunks`);
//! - entidades nomeadas de pessoa, organização e lugar fora desses sintagmas;
//! - pronomes de terceira pessoa (`he`, `her`, `its`, `themselves`...).
//!
//! Cada pronome liga-se à menção compatível mais próxima que o precede, no
//! máximo duas sentenças antes. Compatível quer dizer mesmo número e gênero
//! aceitável (`she` não aponta para "the company"). Nomes próprios repetidos
//! ("John Smith ... Smith") ligam-se pelo núcleo. Os grupos são fechados com
//! union-find e só sobrevivem os que têm pelo menos duas menções.

use std::ops::Range;

use tracing::debug;

use crate::doc::{CorefCluster, Doc};
use crate::entity::EntityLabel;
use crate::parser::DepLabel;

/// Distância máxima, em sentenças, entre um pronome e o antecedente
const MAX_SENTENCE_DISTANCE: usize = 2;

const MASCULINE_NOUNS: &[&str] = &[
    "man", "boy", "father", "son", "brother", "husband", "king", "prince", "uncle",
    "nephew", "grandfather", "gentleman", "sir", "lord", "mr.", "mr", "dad",
];

const FEMININE_NOUNS: &[&str] = &[
    "woman", "girl", "mother", "daughter", "sister", "wife", "queen", "princess",
    "aunt", "niece", "grandmother", "lady", "madam", "mrs.", "mrs", "ms.", "mom",
];

const PERSON_NOUNS: &[&str] = &[
    "person", "people", "teacher", "doctor", "student", "president", "friend",
    "author", "child", "children", "worker", "player", "leader", "officer",
    "neighbor", "lawyer", "senator", "manager", "customer", "citizen",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gender {
    Masculine,
    Feminine,
    /// Pessoa de gênero desconhecido (aceita `he` e `she`)
    Person,
    Neuter,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Number {
    Singular,
    Plural,
}

#[derive(Debug, Clone)]
struct Mention {
    span: Range<usize>,
    head: usize,
    sentence: usize,
    pronoun: bool,
    reflexive: bool,
    gender: Gender,
    number: Number,
}

/// Traços de um pronome de terceira pessoa
fn pronoun_features(lower: &str) -> Option<(Gender, Number, bool)> {
    let features = match lower {
        "he" | "him" | "his" => (Gender::Masculine, Number::Singular, false),
        "himself" => (Gender::Masculine, Number::Singular, true),
        "she" | "her" | "hers" => (Gender::Feminine, Number::Singular, false),
        "herself" => (Gender::Feminine, Number::Singular, true),
        "it" | "its" => (Gender::Neuter, Number::Singular, false),
        "itself" => (Gender::Neuter, Number::Singular, true),
        "they" | "them" | "their" | "theirs" => (Gender::Unknown, Number::Plural, false),
        "themselves" => (Gender::Unknown, Number::Plural, true),
        _ => return None,
    };
    Some(features)
}

/// Resolve a correferência do documento e grava os grupos em `doc.coref_clusters`.
pub fn resolve(doc: &mut Doc) {
    let mentions = collect_mentions(doc);
    let mut sets = DisjointSets::new(mentions.len());

    for (j, mention) in mentions.iter().enumerate() {
        if mention.pronoun {
            if let Some(i) = antecedent(doc, &mentions, j) {
                sets.union(i, j);
            }
        } else if is_proper_head(doc, mention.head) {
            let head_text = doc.tokens[mention.head].text();
            let earlier = mentions[..j].iter().rposition(|m| {
                !m.pronoun && is_proper_head(doc, m.head) && doc.tokens[m.head].text() == head_text
            });
            if let Some(i) = earlier {
                sets.union(i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: Vec<Option<usize>> = vec![None; mentions.len()];
    for i in 0..mentions.len() {
        let root = sets.find(i);
        match group_of_root[root] {
            Some(g) => groups[g].push(i),
            None => {
                group_of_root[root] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }

    let clusters: Vec<CorefCluster> = groups
        .into_iter()
        .filter(|group| group.len() >= 2)
        .map(|group| {
            let main = group
                .iter()
                .find(|&&i| !mentions[i].pronoun)
                .or_else(|| group.first())
                .map(|&i| mentions[i].span.clone())
                .unwrap_or_default();
            CorefCluster {
                main,
                mentions: group.iter().map(|&i| mentions[i].span.clone()).collect(),
            }
        })
        .collect();

    debug!(mentions = mentions.len(), clusters = clusters.len(), "correferência resolvida");
    doc.coref_clusters = Some(clusters);
}

/// Menções candidatas em ordem de posição
fn collect_mentions(doc: &Doc) -> Vec<Mention> {
    let mut mentions: Vec<Mention> = Vec::new();

    for chunk in doc.noun_chunks() {
        let lower = doc.tokens[chunk.root].text().to_lowercase();
        if chunk.len() == 1 && doc.tokens[chunk.root].tag == "PRP" {
            // pronomes de primeira e segunda pessoa não entram
            if pronoun_features(&lower).is_none() {
                continue;
            }
        }
        if let Some(mention) = make_mention(doc, chunk.span, chunk.root) {
            mentions.push(mention);
        }
    }

    // pronomes fora dos sintagmas ("his" em "his dog", objetos reflexivos...)
    for (i, token) in doc.tokens.iter().enumerate() {
        if !matches!(token.tag.as_str(), "PRP" | "PRP$") || pronoun_features(&token.text().to_lowercase()).is_none() {
            continue;
        }
        if mentions.iter().any(|m| m.span == (i..i + 1)) {
            continue;
        }
        if let Some(mention) = make_mention(doc, i..i + 1, i) {
            mentions.push(mention);
        }
    }

    for ent in &doc.ents {
        if !matches!(ent.label, EntityLabel::Person | EntityLabel::Org | EntityLabel::Gpe) {
            continue;
        }
        let span = ent.start..ent.end;
        let overlaps = mentions.iter().any(|m| m.span.start < span.end && span.start < m.span.end);
        if overlaps {
            continue;
        }
        if let Some(mention) = make_mention(doc, span.clone(), span.end - 1) {
            mentions.push(mention);
        }
    }

    mentions.sort_by_key(|m| (m.span.start, m.span.end));
    mentions
}

fn make_mention(doc: &Doc, span: Range<usize>, head: usize) -> Option<Mention> {
    let sentence = doc.sent_of(head)?;
    let token = &doc.tokens[head];
    let lower = token.text().to_lowercase();

    if let Some((gender, number, reflexive)) = pronoun_features(&lower) {
        if span.len() == 1 {
            return Some(Mention { span, head, sentence, pronoun: true, reflexive, gender, number });
        }
    }

    let number = match token.tag.as_str() {
        "NNS" | "NNPS" => Number::Plural,
        _ => Number::Singular,
    };
    let gender = if MASCULINE_NOUNS.contains(&lower.as_str()) {
        Gender::Masculine
    } else if FEMININE_NOUNS.contains(&lower.as_str()) {
        Gender::Feminine
    } else {
        match token.ent_type {
            Some(EntityLabel::Person) => Gender::Person,
            Some(_) => Gender::Neuter,
            None if PERSON_NOUNS.contains(&lower.as_str()) => Gender::Person,
            None if matches!(token.tag.as_str(), "NNP" | "NNPS") => Gender::Unknown,
            None => Gender::Neuter,
        }
    };
    Some(Mention { span, head, sentence, pronoun: false, reflexive: false, gender, number })
}

fn is_proper_head(doc: &Doc, head: usize) -> bool {
    matches!(doc.tokens[head].tag.as_str(), "NNP" | "NNPS")
}

/// Antecedente mais próximo e compatível para o pronome `j`
fn antecedent(doc: &Doc, mentions: &[Mention], j: usize) -> Option<usize> {
    let pronoun = &mentions[j];
    (0..j).rev().find(|&i| {
        let candidate = &mentions[i];
        if pronoun.sentence - candidate.sentence > MAX_SENTENCE_DISTANCE {
            return false;
        }
        // o antecedente não pode conter o pronome ("his dog" ≠ "his")
        if candidate.span.end > pronoun.span.start {
            return false;
        }
        if candidate.number != pronoun.number || !gender_agrees(candidate.gender, pronoun.gender) {
            return false;
        }
        if candidate.pronoun && candidate.gender != pronoun.gender {
            return false;
        }
        !bound_locally(doc, candidate, pronoun)
    })
}

fn gender_agrees(antecedent: Gender, pronoun: Gender) -> bool {
    match pronoun {
        Gender::Masculine | Gender::Feminine => {
            matches!(antecedent, Gender::Person | Gender::Unknown) || antecedent == pronoun
        }
        Gender::Neuter => matches!(antecedent, Gender::Neuter | Gender::Unknown),
        Gender::Person | Gender::Unknown => true,
    }
}

/// Pronome objeto não reflexivo não retoma o sujeito do próprio verbo
/// ("John saw him": `him` não é John); o reflexivo, ao contrário, só retoma ele.
fn bound_locally(doc: &Doc, candidate: &Mention, pronoun: &Mention) -> bool {
    let pronoun_token = &doc.tokens[pronoun.head];
    if !matches!(pronoun_token.dep, DepLabel::Dobj | DepLabel::Dative | DepLabel::Pobj) {
        return false;
    }
    let candidate_token = &doc.tokens[candidate.head];
    let verb = if pronoun_token.dep == DepLabel::Pobj {
        doc.tokens[pronoun_token.head].head
    } else {
        pronoun_token.head
    };
    let same_clause = candidate_token.head == verb
        && matches!(candidate_token.dep, DepLabel::Nsubj | DepLabel::Nsubjpass);
    same_clause != pronoun.reflexive
}

/// Union-find com compressão de caminho
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect() }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Une os conjuntos mantendo como raiz a menção mais antiga
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRecognizer;
    use crate::lexicon::Lexicon;
    use crate::tokenizer::{split_sentences, tokenize};
    use crate::{parser, tagger};

    fn resolved(text: &str) -> Doc {
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        tagger::tag(&mut doc, &Lexicon::english());
        parser::parse(&mut doc);
        EntityRecognizer::english().recognize(&mut doc);
        resolve(&mut doc);
        doc
    }

    fn cluster_texts(doc: &Doc) -> Vec<Vec<String>> {
        doc.coref_clusters
            .iter()
            .flatten()
            .map(|cluster| {
                cluster
                    .mentions
                    .iter()
                    .map(|span| {
                        let start = doc.tokens[span.start].token.start;
                        let end = doc.tokens[span.end - 1].token.end;
                        doc.text[start..end].to_string()
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_pronoun_links_to_person() {
        let doc = resolved("John Smith arrived. He was tired.");
        assert_eq!(cluster_texts(&doc), vec![vec!["John Smith".to_string(), "He".to_string()]]);
        let cluster = &doc.coref_clusters.as_ref().unwrap()[0];
        assert_eq!(cluster.main, 0..2);
    }

    #[test]
    fn test_gender_and_number_agreement() {
        let doc = resolved("The company hired Mary. She liked it.");
        let clusters = cluster_texts(&doc);
        assert!(clusters.contains(&vec!["Mary".to_string(), "She".to_string()]));
        assert!(clusters.contains(&vec!["The company".to_string(), "it".to_string()]));
    }

    #[test]
    fn test_repeated_proper_name() {
        let doc = resolved("Google released a phone. Analysts praised Google.");
        assert_eq!(cluster_texts(&doc), vec![vec!["Google".to_string(), "Google".to_string()]]);
    }

    #[test]
    fn test_no_clusters_without_pronouns() {
        let doc = resolved("The dog barked.");
        assert_eq!(doc.coref_clusters, Some(vec![]));
    }

    #[test]
    fn test_distance_limit() {
        let doc = resolved("Mary left. It rained. It snowed. Then she came back.");
        let clusters = cluster_texts(&doc);
        assert!(!clusters.iter().any(|c| c.contains(&"she".to_string())));
    }

    #[test]
    fn test_disjoint_sets() {
        let mut sets = DisjointSets::new(4);
        sets.union(2, 3);
        sets.union(3, 1);
        assert_eq!(sets.find(3), 1);
        assert_eq!(sets.find(2), 1);
        assert_eq!(sets.find(0), 0);
    }
}
