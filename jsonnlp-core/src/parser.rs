//! # Analisador de Dependências
//!
//! Analisador heurístico baseado em grupos. Cada sentença passa por:
//!
//! 1. **Agrupamento**: os tokens viram grupos nominais (`the quick brown fox`),
//!    grupos verbais (`can't go`, `has been seen`), grupos adjetivais (`very happy`),
//!    tokens soltos e pontuação. A estrutura interna de cada grupo já sai pronta
//!    (`det`, `amod`, `compound`, `aux`, `neg`...).
//! 2. **Orações**: cada grupo verbal é classificado (principal, infinitiva,
//!    subordinada, relativa, participial, coordenada) e ganha sujeito.
//! 3. **Argumentos**: objetos, atributos, preposições e modificadores são ligados
//!    ao verbo ou nome mais próximo.
//! 4. **Saneamento**: ciclos são quebrados, arcos cruzados são "levantados" até o
//!    avô e a pontuação é pendurada no menor ancestral comum dos vizinhos. O
//!    resultado é sempre uma árvore projetiva com uma única raiz.
//!
//! As sentenças são independentes e são analisadas em paralelo com `rayon`.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::doc::{AnalyzedToken, Doc};

/// Rótulo de uma relação de dependência (esquema ClearNLP usado pelos modelos em inglês).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepLabel {
    Root,
    Nsubj,
    Nsubjpass,
    Dobj,
    Dative,
    Attr,
    Acomp,
    Prep,
    Pobj,
    Pcomp,
    Det,
    Predet,
    Amod,
    Advmod,
    Npadvmod,
    Compound,
    Nummod,
    Poss,
    Case,
    Aux,
    Auxpass,
    Neg,
    Cc,
    Conj,
    Mark,
    Xcomp,
    Ccomp,
    Advcl,
    Relcl,
    Acl,
    Prt,
    Expl,
    Appos,
    Intj,
    Punct,
    Dep,
}

impl DepLabel {
    /// Rótulo como aparece na saída (a raiz é "ROOT", o resto em minúsculas)
    pub fn as_str(&self) -> &'static str {
        match self {
            DepLabel::Root => "ROOT",
            DepLabel::Nsubj => "nsubj",
            DepLabel::Nsubjpass => "nsubjpass",
            DepLabel::Dobj => "dobj",
            DepLabel::Dative => "dative",
            DepLabel::Attr => "attr",
            DepLabel::Acomp => "acomp",
            DepLabel::Prep => "prep",
            DepLabel::Pobj => "pobj",
            DepLabel::Pcomp => "pcomp",
            DepLabel::Det => "det",
            DepLabel::Predet => "predet",
            DepLabel::Amod => "amod",
            DepLabel::Advmod => "advmod",
            DepLabel::Npadvmod => "npadvmod",
            DepLabel::Compound => "compound",
            DepLabel::Nummod => "nummod",
            DepLabel::Poss => "poss",
            DepLabel::Case => "case",
            DepLabel::Aux => "aux",
            DepLabel::Auxpass => "auxpass",
            DepLabel::Neg => "neg",
            DepLabel::Cc => "cc",
            DepLabel::Conj => "conj",
            DepLabel::Mark => "mark",
            DepLabel::Xcomp => "xcomp",
            DepLabel::Ccomp => "ccomp",
            DepLabel::Advcl => "advcl",
            DepLabel::Relcl => "relcl",
            DepLabel::Acl => "acl",
            DepLabel::Prt => "prt",
            DepLabel::Expl => "expl",
            DepLabel::Appos => "appos",
            DepLabel::Intj => "intj",
            DepLabel::Punct => "punct",
            DepLabel::Dep => "dep",
        }
    }

    /// Rótulos que fazem de um nome o núcleo de um sintagma nominal
    pub fn is_noun_phrase(&self) -> bool {
        matches!(
            self,
            DepLabel::Nsubj
                | DepLabel::Dobj
                | DepLabel::Nsubjpass
                | DepLabel::Pcomp
                | DepLabel::Pobj
                | DepLabel::Dative
                | DepLabel::Appos
                | DepLabel::Attr
                | DepLabel::Root
        )
    }
}

impl fmt::Display for DepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags de pontuação (penduradas no fim da análise)
const PUNCT_TAGS: &[&str] = &[".", ",", ":", "``", "''", "-LRB-", "-RRB-", "HYPH", "NFP"];

/// Núcleos nominais que indicam tempo ("yesterday", "last week")
const TEMPORAL: &[&str] = &[
    "today", "yesterday", "tomorrow", "tonight", "morning", "afternoon", "evening", "night",
    "week", "month", "year", "weekend", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday",
];

const NEGATIONS: &[&str] = &["not", "n't", "never"];

/// Pronomes oblíquos: não podem ser sujeito
const OBJECT_PRONOUNS: &[&str] = &["me", "him", "us", "them", "whom"];

/// Analisa todas as sentenças do documento em paralelo e grava `head`/`dep` nos tokens.
pub fn parse(doc: &mut Doc) {
    let parsed: Vec<Vec<(usize, DepLabel)>> = doc
        .sents
        .par_iter()
        .map(|range| parse_sentence(&doc.tokens[range.clone()]))
        .collect();

    for (range, arcs) in doc.sents.iter().zip(parsed) {
        for (offset, (head, dep)) in arcs.into_iter().enumerate() {
            let token = &mut doc.tokens[range.start + offset];
            token.head = range.start + head;
            token.dep = dep;
        }
    }
}

/// Analisa uma sentença já etiquetada.
///
/// Retorna, para cada token, `(núcleo, rótulo)` com índices locais à sentença.
/// A raiz aponta para si mesma com o rótulo [`DepLabel::Root`].
pub fn parse_sentence(tokens: &[AnalyzedToken]) -> Vec<(usize, DepLabel)> {
    SentenceParser::new(tokens).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    Noun,
    Verb,
    Adjective,
    Single,
    Punct,
}

/// Grupo contíguo de tokens com um núcleo.
#[derive(Debug, Clone, Copy)]
struct Unit {
    kind: UnitKind,
    start: usize,
    end: usize,
    head: usize,
}

/// Grupo verbal já classificado.
#[derive(Debug, Clone, Copy)]
struct ClauseInfo {
    unit: usize,
    clause: Clause,
    has_subject: bool,
}

/// Papel de um grupo verbal na sentença.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Main,
    Infinitive,
    /// Introduzida por conjunção subordinativa ou advérbio interrogativo (token)
    Subordinate(usize),
    /// Complemento de preposição ("after leaving"); guarda a preposição
    PrepComplement(usize),
    /// Oração relativa; guarda a unidade do antecedente
    Relative(usize),
    /// Particípio modificando um nome; guarda a unidade do nome
    Participial(usize),
    /// Coordenada; guarda o token da conjunção
    Coordinated(usize),
}

struct SentenceParser<'a> {
    tokens: &'a [AnalyzedToken],
    lower: Vec<String>,
    arcs: Vec<Option<(usize, DepLabel)>>,
}

impl<'a> SentenceParser<'a> {
    fn new(tokens: &'a [AnalyzedToken]) -> Self {
        Self {
            tokens,
            lower: tokens.iter().map(|t| t.text().to_lowercase()).collect(),
            arcs: vec![None; tokens.len()],
        }
    }

    fn tag(&self, i: usize) -> &str {
        &self.tokens[i].tag
    }

    fn lemma(&self, i: usize) -> &str {
        &self.tokens[i].lemma
    }

    fn is_punct(&self, i: usize) -> bool {
        PUNCT_TAGS.contains(&self.tag(i))
    }

    /// Liga `dep` a `head` se o token ainda não tiver núcleo.
    fn set(&mut self, dep: usize, head: usize, label: DepLabel) -> bool {
        if dep == head || self.arcs[dep].is_some() {
            return false;
        }
        self.arcs[dep] = Some((head, label));
        true
    }

    fn run(mut self) -> Vec<(usize, DepLabel)> {
        let n = self.tokens.len();
        if n == 0 {
            return Vec::new();
        }
        let content: Vec<usize> = (0..n).filter(|&i| !self.is_punct(i)).collect();
        if content.is_empty() {
            return (0..n)
                .map(|i| if i == 0 { (0, DepLabel::Root) } else { (0, DepLabel::Punct) })
                .collect();
        }

        let units = self.chunk();
        for unit in &units {
            match unit.kind {
                UnitKind::Noun | UnitKind::Adjective => self.label_nominal(unit),
                UnitKind::Verb => self.label_verbal(unit),
                UnitKind::Single | UnitKind::Punct => {}
            }
        }
        let root = self.attach(&units);

        let mut heads: Vec<usize> = vec![root; n];
        let mut labels: Vec<DepLabel> = vec![DepLabel::Dep; n];
        for &i in &content {
            if let Some((head, label)) = self.arcs[i] {
                heads[i] = head;
                labels[i] = label;
            }
        }
        heads[root] = root;
        labels[root] = DepLabel::Root;

        break_cycles(&mut heads, root, &content);
        projectivize(&mut heads, root, &content);

        let is_content: Vec<bool> = (0..n).map(|i| !self.is_punct(i)).collect();
        for p in (0..n).filter(|&i| !is_content[i]) {
            let left = (0..p).rev().find(|&i| is_content[i]);
            let right = (p + 1..n).find(|&i| is_content[i]);
            heads[p] = match (left, right) {
                (Some(l), Some(r)) => lowest_common_ancestor(&heads, root, l, r),
                _ => root,
            };
            labels[p] = DepLabel::Punct;
        }

        heads.into_iter().zip(labels).collect()
    }

    // === Agrupamento ===

    fn chunk(&self) -> Vec<Unit> {
        let n = self.tokens.len();
        let mut units = Vec::new();
        let mut i = 0;
        while i < n {
            let unit = if self.is_punct(i) {
                Unit { kind: UnitKind::Punct, start: i, end: i + 1, head: i }
            } else if let Some(unit) = self.verb_group(i) {
                unit
            } else if let Some(unit) = self.noun_group(i) {
                unit
            } else {
                Unit { kind: UnitKind::Single, start: i, end: i + 1, head: i }
            };
            i = unit.end;
            units.push(unit);
        }
        units
    }

    fn is_verbal(&self, i: usize) -> bool {
        matches!(self.tag(i), "MD" | "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ")
    }

    /// Verbos que podem ser seguidos por outro verbo no mesmo grupo
    fn is_auxiliary(&self, i: usize) -> bool {
        self.tag(i) == "MD" || matches!(self.lemma(i), "be" | "have" | "do")
    }

    /// `[RB]* (MD | VB* | TO) ([RB]* VB*)*`, terminando no verbo principal
    fn verb_group(&self, i: usize) -> Option<Unit> {
        let n = self.tokens.len();
        let mut j = i;
        let mut main = None;
        while j < n {
            if self.is_verbal(j) {
                main = Some(j);
                j += 1;
                if !self.is_auxiliary(j - 1) {
                    break;
                }
            } else if matches!(self.tag(j), "RB" | "TO") {
                // advérbios e "to" só entram se houver verbo logo depois
                let mut k = j;
                while k < n && matches!(self.tag(k), "RB" | "TO") {
                    k += 1;
                }
                if k < n && self.is_verbal(k) && !(self.tag(k - 1) == "TO" && self.tag(k) != "VB") {
                    j = k;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        let head = main?;
        Some(Unit { kind: UnitKind::Verb, start: i, end: head + 1, head })
    }

    fn is_noun(&self, i: usize) -> bool {
        matches!(self.tag(i), "NN" | "NNS" | "NNP" | "NNPS")
    }

    fn is_adjective(&self, i: usize) -> bool {
        matches!(self.tag(i), "JJ" | "JJR" | "JJS")
    }

    /// Grupo nominal: `[DT]* [PRP$] (RB* JJ | CD | NN | POS | $)*` com núcleo no último nome.
    fn noun_group(&self, i: usize) -> Option<Unit> {
        let n = self.tokens.len();
        if matches!(self.tag(i), "PRP" | "EX" | "WP" | "WDT") {
            return Some(Unit { kind: UnitKind::Noun, start: i, end: i + 1, head: i });
        }

        let mut j = i;
        while j < n && matches!(self.tag(j), "PDT" | "DT") {
            j += 1;
        }
        if j < n && matches!(self.tag(j), "PRP$" | "WP$") {
            j += 1;
        }
        let has_det = j > i;

        let (mut last_noun, mut last_symbol, mut last_number) = (None, None, None);
        let mut has_adjective = false;
        while j < n {
            let next_is_noun = j + 1 < n && (self.is_noun(j + 1) || self.is_adjective(j + 1));
            match self.tag(j) {
                "NN" | "NNS" | "NNP" | "NNPS" => last_noun = Some(j),
                "CD" => last_number = Some(j),
                "$" | "#" => last_symbol = Some(j),
                "JJ" | "JJR" | "JJS" => has_adjective = true,
                "VBN" | "VBG" if has_det && next_is_noun => {}
                "RB" if j + 1 < n && self.is_adjective(j + 1) => {}
                "POS" if last_noun.is_some() => {}
                _ => break,
            }
            j += 1;
        }

        if let Some(head) = last_noun.or(last_symbol).or(last_number) {
            let mut end = head + 1;
            while end < j && self.tag(end) == "CD" {
                end += 1;
            }
            return Some(Unit { kind: UnitKind::Noun, start: i, end, head });
        }
        if j == i {
            return None;
        }
        let kind = if has_det || !has_adjective { UnitKind::Noun } else { UnitKind::Adjective };
        Some(Unit { kind, start: i, end: j, head: j - 1 })
    }

    // === Estrutura interna dos grupos ===

    fn modifier_label(&self, k: usize) -> DepLabel {
        match self.tag(k) {
            "DT" if k + 1 < self.tokens.len() && matches!(self.tag(k + 1), "DT" | "PRP$") => DepLabel::Predet,
            "DT" => DepLabel::Det,
            "PDT" => DepLabel::Predet,
            "PRP$" | "WP$" => DepLabel::Poss,
            "CD" => DepLabel::Nummod,
            "JJ" | "JJR" | "JJS" | "VBN" | "VBG" => DepLabel::Amod,
            "NN" | "NNS" | "NNP" | "NNPS" | "$" | "#" => DepLabel::Compound,
            "RB" => DepLabel::Advmod,
            _ => DepLabel::Dep,
        }
    }

    /// Modificadores antes do núcleo apontam para ele; advérbios apontam para o
    /// adjetivo seguinte.
    fn attach_modifiers(&mut self, from: usize, to: usize, head: usize) {
        for k in from..to {
            let target = if self.tag(k) == "RB" { k + 1 } else { head };
            let label = self.modifier_label(k);
            self.set(k, target, label);
        }
    }

    fn label_nominal(&mut self, unit: &Unit) {
        let possessive = (unit.start..unit.head).rev().find(|&k| self.tag(k) == "POS");
        let main_start = match possessive {
            Some(p) if p > unit.start => {
                let owner = p - 1;
                self.set(p, owner, DepLabel::Case);
                self.attach_modifiers(unit.start, owner, owner);
                self.set(owner, unit.head, DepLabel::Poss);
                p + 1
            }
            _ => unit.start,
        };
        self.attach_modifiers(main_start, unit.head, unit.head);
        for k in unit.head + 1..unit.end {
            self.set(k, unit.head, DepLabel::Nummod);
        }
    }

    fn label_verbal(&mut self, unit: &Unit) {
        let passive = self.is_passive(unit);
        for k in unit.start..unit.head {
            let label = match self.tag(k) {
                "RB" if NEGATIONS.contains(&self.lower[k].as_str()) => DepLabel::Neg,
                "RB" => DepLabel::Advmod,
                _ if passive && self.lemma(k) == "be" => DepLabel::Auxpass,
                _ => DepLabel::Aux,
            };
            self.set(k, unit.head, label);
        }
    }

    fn is_passive(&self, unit: &Unit) -> bool {
        self.tag(unit.head) == "VBN"
            && (unit.start..unit.head).any(|k| self.lemma(k) == "be" && self.is_verbal(k))
    }

    /// Grupo verbal cujo verbo principal é "be" (cópula)
    fn is_copula(&self, unit: &Unit) -> bool {
        self.lemma(unit.head) == "be"
    }

    // === Orações e argumentos ===

    fn is_prep(&self, unit: &Unit) -> bool {
        unit.kind == UnitKind::Single && matches!(self.tag(unit.head), "IN" | "TO")
    }

    fn is_relative_pronoun(&self, unit: &Unit) -> bool {
        unit.kind == UnitKind::Noun && matches!(self.tag(unit.head), "WP" | "WDT")
    }

    fn is_single(&self, unit: Option<&Unit>, tags: &[&str]) -> bool {
        unit.is_some_and(|u| u.kind == UnitKind::Single && tags.contains(&self.tag(u.head)))
    }

    /// Liga grupos entre si e devolve a raiz da sentença.
    fn attach(&mut self, units: &[Unit]) -> usize {
        let mut taken = vec![false; units.len()];
        let mut clauses: Vec<ClauseInfo> = Vec::new();

        for k in (0..units.len()).filter(|&k| units[k].kind == UnitKind::Verb) {
            let verb = units[k];
            let (subject, intro) = self.find_subject(units, k, &taken, &clauses);
            let clause = self.classify(units, k, subject, intro, !clauses.is_empty());

            if let Some(s) = subject {
                let head = units[s].head;
                let label = match self.tag(head) {
                    "EX" => DepLabel::Expl,
                    _ if self.is_passive(&verb) => DepLabel::Nsubjpass,
                    _ => DepLabel::Nsubj,
                };
                self.set(head, verb.head, label);
                taken[s] = true;
            }
            if let Clause::Subordinate(marker) = clause {
                let label = if self.tag(marker) == "WRB" { DepLabel::Advmod } else { DepLabel::Mark };
                self.set(marker, verb.head, label);
            }
            taken[k] = true;
            clauses.push(ClauseInfo { unit: k, clause, has_subject: subject.is_some() });
        }

        let root = clauses
            .iter()
            .find(|info| info.clause == Clause::Main)
            .or(clauses.first())
            .map(|info| units[info.unit].head)
            .or_else(|| units.iter().find(|u| u.kind == UnitKind::Noun).map(|u| u.head))
            .or_else(|| units.iter().find(|u| u.kind == UnitKind::Adjective).map(|u| u.head))
            .or_else(|| units.iter().find(|u| u.kind != UnitKind::Punct).map(|u| u.head))
            .unwrap_or(0);

        self.attach_clauses(units, &clauses, root);
        self.attach_phrases(units, &mut taken, root);
        root
    }

    /// Classifica o grupo verbal `k` a partir do sujeito e da unidade que o introduz.
    fn classify(
        &mut self,
        units: &[Unit],
        k: usize,
        subject: Option<usize>,
        intro: Option<usize>,
        has_previous: bool,
    ) -> Clause {
        let verb = units[k];
        // antecedente: grupo nominal antes do pronome relativo (com vírgula opcional)
        let antecedent = |u: usize| -> Option<usize> {
            let mut before = u.checked_sub(1)?;
            if units[before].kind == UnitKind::Punct {
                before = before.checked_sub(1)?;
            }
            (units[before].kind == UnitKind::Noun).then_some(before)
        };

        if self.tag(verb.start) == "TO" {
            return Clause::Infinitive;
        }
        if let Some(rel) = subject.filter(|&s| self.is_relative_pronoun(&units[s])).and_then(antecedent) {
            return Clause::Relative(rel);
        }
        let Some(u) = intro else {
            return Clause::Main;
        };
        let intro_unit = units[u];
        let marker = intro_unit.head;

        if subject.is_some() && self.is_relative_pronoun(&intro_unit) {
            if let Some(rel) = antecedent(u) {
                // relativa de objeto: "the book that I read"
                self.set(marker, verb.head, DepLabel::Dobj);
                return Clause::Relative(rel);
            }
        }
        if self.is_single(Some(&intro_unit), &["IN", "WRB"]) && self.lower[marker] != "of" {
            if subject.is_none() && self.tag(marker) == "IN" && self.tag(verb.head) == "VBG" {
                return Clause::PrepComplement(marker);
            }
            return Clause::Subordinate(marker);
        }
        if self.is_single(Some(&intro_unit), &["CC"]) && has_previous {
            return Clause::Coordinated(marker);
        }
        if subject.is_none()
            && verb.start == verb.head
            && matches!(self.tag(verb.head), "VBG" | "VBN")
            && intro_unit.kind == UnitKind::Noun
        {
            return Clause::Participial(u);
        }
        Clause::Main
    }

    /// Procura o sujeito do grupo verbal `k`; devolve `(unidade do sujeito, unidade introdutora)`.
    fn find_subject(
        &mut self,
        units: &[Unit],
        k: usize,
        taken: &[bool],
        clauses: &[ClauseInfo],
    ) -> (Option<usize>, Option<usize>) {
        let Some(prev) = k.checked_sub(1) else {
            return (None, None);
        };
        let unit = units[prev];
        let usable = unit.kind == UnitKind::Noun
            && !taken[prev]
            && !(unit.start == unit.head && OBJECT_PRONOUNS.contains(&self.lower[unit.head].as_str()));

        if usable {
            // sobe por sintagmas preposicionados e coordenados:
            // "the man in the car left", "the dog and the cat ran"
            let mut s = prev;
            while s >= 2 && units[s - 2].kind == UnitKind::Noun && !taken[s - 2] {
                let link = units[s - 1];
                if self.is_prep(&link) && self.lower[link.head] != "that" {
                    self.set(link.head, units[s - 2].head, DepLabel::Prep);
                } else if !self.is_single(Some(&link), &["CC"]) {
                    break;
                }
                s -= 2;
            }
            return (Some(s), s.checked_sub(1));
        }

        // sujeito compartilhado com a relativa anterior: "the man who left came"
        if let Some(ClauseInfo { unit: rk, clause: Clause::Relative(ant) | Clause::Participial(ant), .. }) =
            clauses.last().copied()
        {
            let introduced = unit.kind == UnitKind::Single && matches!(self.tag(unit.head), "CC" | "IN" | "WRB");
            if !taken[ant] && !introduced {
                if unit.kind == UnitKind::Noun && !taken[prev] && prev > rk {
                    self.set(unit.head, units[rk].head, DepLabel::Dobj);
                }
                return (Some(ant), Some(prev));
            }
        }
        (None, Some(prev))
    }

    fn attach_clauses(&mut self, units: &[Unit], clauses: &[ClauseInfo], root: usize) {
        for (idx, info) in clauses.iter().enumerate() {
            let verb = units[info.unit].head;
            if verb == root {
                continue;
            }
            let earlier = &clauses[..idx];
            let previous = earlier.last().map(|c| units[c.unit].head);
            match info.clause {
                Clause::Main => self.set(verb, previous.unwrap_or(root), DepLabel::Ccomp),
                Clause::Infinitive => match previous {
                    Some(p) => self.set(verb, p, DepLabel::Xcomp),
                    None => self.set(verb, root, DepLabel::Advcl),
                },
                Clause::Subordinate(marker) => {
                    let label = match self.lower[marker].as_str() {
                        "that" | "whether" if previous.is_some() => DepLabel::Ccomp,
                        _ => DepLabel::Advcl,
                    };
                    self.set(verb, previous.unwrap_or(root), label)
                }
                Clause::PrepComplement(prep) => self.set(verb, prep, DepLabel::Pcomp),
                Clause::Relative(ant) => self.set(verb, units[ant].head, DepLabel::Relcl),
                Clause::Participial(ant) => self.set(verb, units[ant].head, DepLabel::Acl),
                Clause::Coordinated(cc) => {
                    // com sujeito próprio coordena com a oração principal anterior;
                    // sem sujeito, com o verbo imediatamente anterior
                    let target = if info.has_subject {
                        earlier
                            .iter()
                            .rev()
                            .find(|c| matches!(c.clause, Clause::Main | Clause::Coordinated(_)))
                            .map(|c| units[c.unit].head)
                            .or(previous)
                    } else {
                        previous
                    };
                    let first = self.first_conjunct(target.unwrap_or(root));
                    self.set(cc, first, DepLabel::Cc);
                    self.set(verb, first, DepLabel::Conj)
                }
            };
        }
    }

    /// Sobe pela cadeia de `conj` até o primeiro conjunto
    fn first_conjunct(&self, mut token: usize) -> usize {
        while let Some((head, DepLabel::Conj)) = self.arcs[token] {
            token = head;
        }
        token
    }

    /// Verbo mais próximo à esquerda de uma unidade, senão à direita, senão a raiz
    fn nearest_verb(&self, units: &[Unit], k: usize, root: usize) -> usize {
        units[..k]
            .iter()
            .rev()
            .chain(units[k + 1..].iter())
            .find(|u| u.kind == UnitKind::Verb)
            .map_or(root, |u| u.head)
    }

    fn attach_phrases(&mut self, units: &[Unit], taken: &mut [bool], root: usize) {
        let mut has_object = vec![false; self.tokens.len()];

        for k in 0..units.len() {
            let unit = units[k];
            if taken[k] || unit.head == root {
                continue;
            }
            let prev = k.checked_sub(1).map(|p| units[p]);
            let next = units.get(k + 1).copied();
            let head = unit.head;

            match unit.kind {
                UnitKind::Noun => {
                    if prev.is_some_and(|p| self.is_prep(&p)) {
                        let prep = prev.map_or(root, |p| p.head);
                        self.set(head, prep, DepLabel::Pobj);
                    } else if TEMPORAL.contains(&self.lemma(head).to_lowercase().as_str()) {
                        let verb = self.nearest_verb(units, k, root);
                        self.set(head, verb, DepLabel::Npadvmod);
                    } else if let Some(verb) = self.verb_before(units, k).filter(|v| !has_object[units[*v].head]) {
                        let verb_unit = units[verb];
                        let label = if self.is_copula(&verb_unit) {
                            DepLabel::Attr
                        } else if next.is_some_and(|n| n.kind == UnitKind::Noun) && !taken[k + 1] {
                            DepLabel::Dative
                        } else {
                            has_object[verb_unit.head] = true;
                            DepLabel::Dobj
                        };
                        self.set(head, verb_unit.head, label);
                    } else if let Some((verb, DepLabel::Dative)) =
                        prev.filter(|p| p.kind == UnitKind::Noun).and_then(|p| self.arcs[p.head])
                    {
                        // "gave her a book": o segundo grupo é o objeto direto
                        has_object[verb] = true;
                        self.set(head, verb, DepLabel::Dobj);
                    } else if let Some(first) = self.coordinated_with(units, k, UnitKind::Noun) {
                        let cc = units[k - 1].head;
                        let first = self.first_conjunct(first);
                        self.set(cc, first, DepLabel::Cc);
                        self.set(head, first, DepLabel::Conj);
                    } else if k >= 2
                        && prev.is_some_and(|p| self.tag(p.head) == ",")
                        && units[k - 2].kind == UnitKind::Noun
                        && next.map_or(true, |n| n.kind == UnitKind::Punct)
                    {
                        self.set(head, units[k - 2].head, DepLabel::Appos);
                    } else {
                        let verb = self.nearest_verb(units, k, root);
                        self.set(head, verb, DepLabel::Dep);
                    }
                }
                UnitKind::Adjective => {
                    if let Some(first) = self.coordinated_with(units, k, UnitKind::Adjective) {
                        let cc = units[k - 1].head;
                        self.set(cc, first, DepLabel::Cc);
                        self.set(head, first, DepLabel::Conj);
                    } else if let Some(verb) = self.verb_before(units, k) {
                        self.set(head, units[verb].head, DepLabel::Acomp);
                    } else if let Some(noun) = next.filter(|n| n.kind == UnitKind::Noun) {
                        self.set(head, noun.head, DepLabel::Amod);
                    } else {
                        let verb = self.nearest_verb(units, k, root);
                        self.set(head, verb, DepLabel::Acomp);
                    }
                }
                UnitKind::Single => self.attach_single(units, k, root),
                UnitKind::Verb | UnitKind::Punct => {}
            }
            taken[k] = true;
        }
    }

    /// Grupo verbal imediatamente antes de `k` (pulando partículas e advérbios)
    fn verb_before(&self, units: &[Unit], k: usize) -> Option<usize> {
        let mut p = k.checked_sub(1)?;
        while units[p].kind == UnitKind::Single && matches!(self.tag(units[p].head), "RP" | "RB") {
            p = p.checked_sub(1)?;
        }
        (units[p].kind == UnitKind::Verb).then_some(p)
    }

    /// `X CC X`: devolve o núcleo do primeiro conjunto
    fn coordinated_with(&self, units: &[Unit], k: usize, kind: UnitKind) -> Option<usize> {
        if k < 2 || !self.is_single(units.get(k - 1), &["CC"]) {
            return None;
        }
        let before = units[k - 2];
        (before.kind == kind).then_some(before.head)
    }

    fn attach_single(&mut self, units: &[Unit], k: usize, root: usize) {
        let unit = units[k];
        let token = unit.head;
        let prev = k.checked_sub(1).map(|p| units[p]);
        let next = units.get(k + 1).copied();

        match self.tag(token) {
            "IN" | "TO" => {
                let noun_before = prev.filter(|p| p.kind == UnitKind::Noun).map(|p| p.head);
                let verb_before = units[..k].iter().rev().find(|u| u.kind == UnitKind::Verb).map(|u| u.head);
                let head = if self.lower[token] == "of" {
                    noun_before.or(verb_before)
                } else {
                    verb_before.or(noun_before)
                };
                let head = head.unwrap_or_else(|| self.nearest_verb(units, k, root));
                self.set(token, head, DepLabel::Prep);
            }
            "RP" => {
                let verb = self.nearest_verb(units, k, root);
                self.set(token, verb, DepLabel::Prt);
            }
            "RB" | "RBR" | "RBS" | "WRB" => {
                let label = if NEGATIONS.contains(&self.lower[token].as_str()) {
                    DepLabel::Neg
                } else {
                    DepLabel::Advmod
                };
                let verb = match (prev, next) {
                    (Some(p), _) if p.kind == UnitKind::Verb => p.head,
                    (_, Some(n)) if n.kind == UnitKind::Verb => n.head,
                    _ => self.nearest_verb(units, k, root),
                };
                self.set(token, verb, label);
            }
            "CC" => {
                let head = prev.filter(|p| p.kind != UnitKind::Punct).map_or(root, |p| p.head);
                self.set(token, head, DepLabel::Cc);
            }
            "UH" => {
                self.set(token, root, DepLabel::Intj);
            }
            "POS" if token > 0 && !self.is_punct(token - 1) => {
                self.set(token, token - 1, DepLabel::Case);
            }
            _ => {
                self.set(token, root, DepLabel::Dep);
            }
        }
    }
}

/// `ancestor` domina `node` (ou é o próprio nó)?
fn dominates(heads: &[usize], root: usize, ancestor: usize, mut node: usize) -> bool {
    if ancestor == root {
        return true;
    }
    for _ in 0..heads.len() {
        if node == ancestor {
            return true;
        }
        if node == root {
            return false;
        }
        node = heads[node];
    }
    false
}

/// Religa à raiz qualquer token cuja cadeia de núcleos não chegue nela
fn break_cycles(heads: &mut [usize], root: usize, content: &[usize]) {
    for &start in content {
        let mut seen = vec![false; heads.len()];
        let mut node = start;
        while node != root {
            if seen[node] {
                heads[node] = root;
                break;
            }
            seen[node] = true;
            node = heads[node];
        }
    }
}

/// Levanta arcos cruzados até o avô até que a árvore seja projetiva
fn projectivize(heads: &mut [usize], root: usize, content: &[usize]) {
    loop {
        let crossing = content.iter().copied().find(|&dep| {
            let head = heads[dep];
            if dep == root || head == root {
                return false;
            }
            let (low, high) = if head < dep { (head, dep) } else { (dep, head) };
            content
                .iter()
                .filter(|&&x| x > low && x < high)
                .any(|&x| !dominates(heads, root, head, x))
        });
        match crossing {
            Some(dep) => heads[dep] = heads[heads[dep]],
            None => break,
        }
    }
}

fn lowest_common_ancestor(heads: &[usize], root: usize, a: usize, b: usize) -> usize {
    let mut ancestors = vec![a];
    let mut node = a;
    while node != root && ancestors.len() <= heads.len() {
        node = heads[node];
        ancestors.push(node);
    }
    let mut node = b;
    for _ in 0..=heads.len() {
        if ancestors.contains(&node) {
            return node;
        }
        if node == root {
            break;
        }
        node = heads[node];
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::tagger;
    use crate::tokenizer::{split_sentences, tokenize};

    fn parsed(text: &str) -> Doc {
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        tagger::tag(&mut doc, &Lexicon::english());
        parse(&mut doc);
        doc
    }

    fn arcs(doc: &Doc) -> Vec<(&str, &str, &str)> {
        doc.tokens
            .iter()
            .map(|t| (t.text(), t.dep.as_str(), doc.tokens[t.head].text()))
            .collect()
    }

    /// Uma raiz por sentença, núcleos dentro da sentença, sem ciclos
    fn assert_well_formed(doc: &Doc) {
        for range in &doc.sents {
            let roots: Vec<usize> = range.clone().filter(|&i| doc.tokens[i].dep == DepLabel::Root).collect();
            assert_eq!(roots.len(), 1);
            let root = roots[0];
            assert_eq!(doc.tokens[root].head, root);
            for i in range.clone() {
                assert!(range.contains(&doc.tokens[i].head));
                let mut node = i;
                for _ in 0..range.len() {
                    node = doc.tokens[node].head;
                }
                assert_eq!(node, root);
            }
        }
    }

    #[test]
    fn test_parse_simple_sentence() {
        let doc = parsed("The quick brown fox jumps over the lazy dog.");
        assert_well_formed(&doc);
        assert_eq!(
            arcs(&doc),
            vec![
                ("The", "det", "fox"),
                ("quick", "amod", "fox"),
                ("brown", "amod", "fox"),
                ("fox", "nsubj", "jumps"),
                ("jumps", "ROOT", "jumps"),
                ("over", "prep", "jumps"),
                ("the", "det", "dog"),
                ("lazy", "amod", "dog"),
                ("dog", "pobj", "over"),
                (".", "punct", "jumps"),
            ]
        );
    }

    #[test]
    fn test_parse_modal_negation_and_copula() {
        let doc = parsed("Dr. Smith can't go. He is sick.");
        assert_well_formed(&doc);
        let arcs = arcs(&doc);
        assert_eq!(arcs[0], ("Dr.", "compound", "Smith"));
        assert_eq!(arcs[1], ("Smith", "nsubj", "go"));
        assert_eq!(arcs[2], ("ca", "aux", "go"));
        assert_eq!(arcs[3], ("n't", "neg", "go"));
        assert_eq!(arcs[4], ("go", "ROOT", "go"));
        assert_eq!(arcs[6], ("He", "nsubj", "is"));
        assert_eq!(arcs[8], ("sick", "acomp", "is"));
    }

    #[test]
    fn test_parse_object_and_possessive() {
        let doc = parsed("John's dog chased the cat.");
        assert_well_formed(&doc);
        let arcs = arcs(&doc);
        assert_eq!(arcs[0], ("John", "poss", "dog"));
        assert_eq!(arcs[1], ("'s", "case", "John"));
        assert_eq!(arcs[2], ("dog", "nsubj", "chased"));
        assert_eq!(arcs[5], ("cat", "dobj", "chased"));
    }

    #[test]
    fn test_parse_infinitive_and_coordination() {
        let doc = parsed("I want to go and she stayed.");
        assert_well_formed(&doc);
        let arcs = arcs(&doc);
        assert_eq!(arcs[1], ("want", "ROOT", "want"));
        assert_eq!(arcs[2], ("to", "aux", "go"));
        assert_eq!(arcs[3], ("go", "xcomp", "want"));
        assert_eq!(arcs[4], ("and", "cc", "want"));
        assert_eq!(arcs[6], ("stayed", "conj", "want"));
    }

    #[test]
    fn test_parse_without_verb() {
        let doc = parsed("The big red ball");
        assert_well_formed(&doc);
        assert_eq!(doc.tokens[3].dep, DepLabel::Root);
    }

    #[test]
    fn test_parse_punctuation_only() {
        let doc = parsed("...");
        assert_well_formed(&doc);
    }

    #[test]
    fn test_projectivize_lifts_crossing_arc() {
        let mut heads = vec![1, 3, 3, 3];
        projectivize(&mut heads, 3, &[0, 1, 2, 3]);
        assert_eq!(heads, vec![1, 3, 3, 3]);

        // 2 -> 0 passa por cima de 1, que pende de 3
        let mut heads = vec![2, 3, 3, 3];
        projectivize(&mut heads, 3, &[0, 1, 2, 3]);
        assert_eq!(heads, vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_parse_relative_clause() {
        let doc = parsed("The man who left came back.");
        assert_well_formed(&doc);
        let arcs = arcs(&doc);
        assert_eq!(arcs[1], ("man", "nsubj", "came"));
        assert_eq!(arcs[2], ("who", "nsubj", "left"));
        assert_eq!(arcs[3], ("left", "relcl", "man"));
        assert_eq!(arcs[4], ("came", "ROOT", "came"));
    }

    #[test]
    fn test_parse_subordinate_clause() {
        let doc = parsed("Because he left, she cried.");
        assert_well_formed(&doc);
        let arcs = arcs(&doc);
        assert_eq!(arcs[0], ("Because", "mark", "left"));
        assert_eq!(arcs[2], ("left", "advcl", "cried"));
        assert_eq!(arcs[3], (",", "punct", "cried"));
        assert_eq!(arcs[5], ("cried", "ROOT", "cried"));
    }
}
