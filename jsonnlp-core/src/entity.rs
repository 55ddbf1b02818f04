//! # Reconhecimento de Entidades por Regras
//!
//! O reconhecedor combina gazetteers (listas de nomes conhecidos), padrões de
//! título e de sufixo e expressões regulares para números, datas, valores e
//! porcentagens. O resultado vai para o `Doc` em dois formatos:
//!
//! - **BIO** por token (`ent_iob` + `ent_type`), que alimenta o `tokenList`;
//! - **spans** (`doc.ents`), que agrupam os tokens de cada entidade.
//!
//! ## Ordem das regras
//!
//! As regras mais específicas rodam primeiro e um token já marcado nunca é
//! sobrescrito:
//!
//! 1. Valores monetários e porcentagens (`$ 3.50`, `40 %`, `12 percent`)
//! 2. Datas (meses, dias da semana, anos, "today")
//! 3. Gazetteers de organização e de localização (n-gramas)
//! 4. Pessoas: prenome conhecido ou título seguido de nome próprio
//! 5. Organizações por sufixo (`Acme Corp.`, `Stanford University`)
//! 6. Ordinais e cardinais restantes
//!
//! Uma sequência de nomes próprios sem nenhuma evidência fica sem entidade.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::doc::{AnalyzedToken, Doc};

/// Tipos de entidade reconhecidos (nomes do esquema OntoNotes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Org,
    Gpe,
    Date,
    Cardinal,
    Ordinal,
    Money,
    Percent,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Org => "ORG",
            EntityLabel::Gpe => "GPE",
            EntityLabel::Date => "DATE",
            EntityLabel::Cardinal => "CARDINAL",
            EntityLabel::Ordinal => "ORDINAL",
            EntityLabel::Money => "MONEY",
            EntityLabel::Percent => "PERCENT",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Posição do token dentro de uma entidade (esquema BIO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntIob {
    /// Primeiro token da entidade
    Begin,
    /// Continuação da entidade
    Inside,
    /// Fora de qualquer entidade
    Outside,
}

impl EntIob {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntIob::Begin => "B",
            EntIob::Inside => "I",
            EntIob::Outside => "O",
        }
    }
}

/// Uma entidade reconhecida: intervalo de tokens `[start, end)` e rótulo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    /// Texto original da entidade
    pub text: String,
}

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december", "jan.", "feb.", "mar.", "apr.",
    "jun.", "jul.", "aug.", "sep.", "sept.", "oct.", "nov.", "dec.",
];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const RELATIVE_DAYS: &[&str] = &["today", "yesterday", "tomorrow", "tonight"];

const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
    "ninth", "tenth", "eleventh", "twelfth", "hundredth", "thousandth",
];

const MAGNITUDES: &[&str] = &["hundred", "thousand", "million", "billion", "trillion"];

const CURRENCY_SYMBOLS: &[&str] = &["$", "€", "£", "¥", "US$"];

const CURRENCY_WORDS: &[&str] = &["dollars", "dollar", "euros", "euro", "pounds", "cents", "yen"];

const FIRST_NAMES: &[&str] = &[
    "john", "mary", "james", "robert", "michael", "william", "david", "richard",
    "joseph", "thomas", "charles", "daniel", "matthew", "anthony", "mark", "paul",
    "steven", "andrew", "kevin", "brian", "george", "edward", "peter", "jack",
    "patricia", "jennifer", "linda", "elizabeth", "barbara", "susan", "jessica",
    "sarah", "karen", "nancy", "lisa", "betty", "margaret", "sandra", "ashley",
    "emily", "donna", "michelle", "carol", "amanda", "melissa", "anna", "alice",
    "bob", "tom", "bill", "joe", "jim", "tim", "sam", "ben", "kate", "emma",
    "barack", "donald", "hillary", "angela", "elon", "steve", "tim", "bernie",
];

const PERSON_TITLES: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sen.", "rep.", "gov.", "gen.", "capt.",
    "mr", "mrs", "ms", "dr", "president", "senator", "governor", "professor",
    "judge", "minister", "chancellor", "king", "queen", "prince", "princess",
    "pope", "sir", "lady", "lord", "uncle", "aunt",
];

const ORG_SUFFIXES: &[&str] = &[
    "inc.", "inc", "corp.", "corp", "ltd.", "ltd", "co.", "llc", "plc", "gmbh",
    "company", "corporation", "university", "institute", "bank", "group",
    "foundation", "association", "agency", "ministry", "council", "committee",
];

const ORGANIZATIONS: &[&str] = &[
    "google", "microsoft", "apple", "amazon", "facebook", "ibm", "intel", "nasa",
    "fbi", "cia", "nato", "un", "eu", "who", "unesco", "congress", "senate",
    "united nations", "european union", "white house", "supreme court",
    "world bank", "red cross", "new york times", "washington post",
];

const LOCATIONS: &[&str] = &[
    "america", "usa", "u.s.", "u.s", "us", "uk", "u.k.", "britain", "england",
    "france", "germany", "italy", "spain", "china", "japan", "india", "russia",
    "canada", "mexico", "brazil", "australia", "ireland", "scotland", "israel",
    "egypt", "iran", "iraq", "texas", "california", "florida", "ohio", "london",
    "paris", "berlin", "rome", "madrid", "tokyo", "beijing", "moscow", "chicago",
    "boston", "seattle", "dublin", "washington", "new york", "los angeles",
    "san francisco", "hong kong", "united states", "united kingdom",
    "new zealand", "south africa", "new jersey",
];

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d{1,3}(,\d{3})+|\d+)(\.\d+)?$").expect("valid regex")
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(1[5-9]|20)\d{2}s?$").expect("valid regex"));

static DAY_OF_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-9]|[12]\d|3[01])(st|nd|rd|th)?$").expect("valid regex"));

static ORDINAL_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(st|nd|rd|th)$").expect("valid regex"));

/// Reconhecedor de entidades baseado em regras e gazetteers.
pub struct EntityRecognizer {
    first_names: HashSet<String>,
    person_titles: HashSet<String>,
    org_suffixes: HashSet<String>,
    /// Organizações conhecidas como n-gramas em minúsculas
    organizations: Vec<Vec<String>>,
    /// Países, estados e cidades como n-gramas em minúsculas
    locations: Vec<Vec<String>>,
}

impl EntityRecognizer {
    /// Reconhecedor vazio, sem gazetteers
    pub fn new() -> Self {
        Self {
            first_names: HashSet::new(),
            person_titles: HashSet::new(),
            org_suffixes: HashSet::new(),
            organizations: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// Reconhecedor com os gazetteers embutidos do inglês
    pub fn english() -> Self {
        let mut recognizer = Self::new();
        for name in FIRST_NAMES {
            recognizer.add_first_name(name);
        }
        for title in PERSON_TITLES {
            recognizer.person_titles.insert(title.to_string());
        }
        for suffix in ORG_SUFFIXES {
            recognizer.org_suffixes.insert(suffix.to_string());
        }
        for org in ORGANIZATIONS {
            recognizer.add_org(org);
        }
        for place in LOCATIONS {
            recognizer.add_location(place);
        }
        recognizer
    }

    pub fn add_first_name(&mut self, name: &str) {
        self.first_names.insert(name.to_lowercase());
    }

    pub fn add_org(&mut self, name: &str) {
        let parts = split_lower(name);
        if !parts.is_empty() {
            self.organizations.push(parts);
        }
    }

    pub fn add_location(&mut self, name: &str) {
        let parts = split_lower(name);
        if !parts.is_empty() {
            self.locations.push(parts);
        }
    }

    /// Marca as entidades do documento (BIO por token e `doc.ents`).
    pub fn recognize(&self, doc: &mut Doc) {
        let mut spans: Vec<(Range<usize>, EntityLabel)> = Vec::new();
        for sent in &doc.sents {
            let offset = sent.start;
            for (range, label) in self.apply(&doc.tokens[sent.clone()]) {
                spans.push((range.start + offset..range.end + offset, label));
            }
        }

        for token in doc.tokens.iter_mut() {
            token.ent_iob = EntIob::Outside;
            token.ent_type = None;
        }
        doc.ents.clear();
        for (range, label) in spans {
            for i in range.clone() {
                doc.tokens[i].ent_iob = if i == range.start { EntIob::Begin } else { EntIob::Inside };
                doc.tokens[i].ent_type = Some(label);
            }
            let first = &doc.tokens[range.start].token;
            let last = &doc.tokens[range.end - 1].token;
            doc.ents.push(EntitySpan {
                start: range.start,
                end: range.end,
                label,
                text: doc.text[first.start..last.end].to_string(),
            });
        }
        debug!(entities = doc.ents.len(), "entidades reconhecidas");
    }

    /// Aplica todas as regras a uma sentença.
    ///
    /// Retorna os spans (índices relativos à sentença) ordenados por posição.
    pub fn apply(&self, tokens: &[AnalyzedToken]) -> Vec<(Range<usize>, EntityLabel)> {
        let lower: Vec<String> = tokens.iter().map(|t| t.text().to_lowercase()).collect();
        let mut marks = Marks::new(tokens.len());

        // 1. Dinheiro e porcentagem
        for i in 0..tokens.len() {
            if CURRENCY_SYMBOLS.contains(&tokens[i].text()) && i + 1 < tokens.len() && is_number(&tokens[i + 1]) {
                let end = extend_number(&lower, i + 2);
                marks.mark(i..end, EntityLabel::Money);
            } else if is_number(&tokens[i]) {
                let end = extend_number(&lower, i + 1);
                match lower.get(end).map(String::as_str) {
                    Some("%") | Some("percent") => marks.mark(i..end + 1, EntityLabel::Percent),
                    Some(word) if CURRENCY_WORDS.contains(&word) => marks.mark(i..end + 1, EntityLabel::Money),
                    _ => {}
                }
            }
        }

        // 2. Datas
        for i in 0..tokens.len() {
            let word = lower[i].as_str();
            if MONTHS.contains(&word) && is_capitalized(tokens[i].text()) {
                // "May" sozinho como verbo modal não é data
                if tokens[i].tag == "MD" {
                    continue;
                }
                let mut start = i;
                if i > 0 && DAY_OF_MONTH.is_match(&lower[i - 1]) {
                    start = i - 1;
                }
                let mut end = i + 1;
                if lower.get(end).is_some_and(|w| DAY_OF_MONTH.is_match(w)) {
                    end += 1;
                }
                if lower.get(end).is_some_and(|w| w == ",") && lower.get(end + 1).is_some_and(|w| YEAR.is_match(w)) {
                    end += 2;
                } else if lower.get(end).is_some_and(|w| YEAR.is_match(w)) {
                    end += 1;
                }
                marks.mark(start..end, EntityLabel::Date);
            } else if WEEKDAYS.contains(&word) || RELATIVE_DAYS.contains(&word) {
                marks.mark(i..i + 1, EntityLabel::Date);
            } else if YEAR.is_match(word) && i > 0 && matches!(lower[i - 1].as_str(), "in" | "since" | "by" | "until" | "of" | "from") {
                marks.mark(i..i + 1, EntityLabel::Date);
            }
        }

        // 3. Gazetteers de organização e de localização
        for i in 0..tokens.len() {
            if !is_capitalized(tokens[i].text()) {
                continue;
            }
            if let Some(len) = match_ngram(&self.organizations, &lower[i..]) {
                marks.mark(i..i + len, EntityLabel::Org);
            } else if let Some(len) = match_ngram(&self.locations, &lower[i..]) {
                // "US" em caixa alta é o país, "us" em minúsculas é pronome
                if lower[i] == "us" && tokens[i].text() != "US" {
                    continue;
                }
                marks.mark(i..i + len, EntityLabel::Gpe);
            }
        }

        // 4. Pessoas: prenome conhecido ou título + nome próprio
        for i in 0..tokens.len() {
            let by_name = self.first_names.contains(&lower[i]) && is_proper(&tokens[i]);
            let by_title = i > 0 && self.person_titles.contains(&lower[i - 1]) && is_proper(&tokens[i]);
            if by_name || by_title {
                let end = proper_run_end(tokens, i);
                marks.mark(i..end, EntityLabel::Person);
            }
        }

        // 5. Organização por sufixo: nomes próprios seguidos de "Inc.", "University"...
        for i in 1..tokens.len() {
            if !self.org_suffixes.contains(&lower[i]) || !is_capitalized(tokens[i].text()) {
                continue;
            }
            let mut start = i;
            while start > 0 && is_proper(&tokens[start - 1]) && !marks.is_marked(start - 1) {
                start -= 1;
            }
            if start < i {
                marks.mark(start..i + 1, EntityLabel::Org);
            }
        }

        // 6. Ordinais e cardinais restantes
        for i in 0..tokens.len() {
            if ORDINAL_DIGITS.is_match(&lower[i]) || (ORDINAL_WORDS.contains(&lower[i].as_str()) && tokens[i].tag == "JJ") {
                marks.mark(i..i + 1, EntityLabel::Ordinal);
            } else if tokens[i].tag == "CD" {
                let end = extend_number(&lower, i + 1);
                marks.mark(i..end, EntityLabel::Cardinal);
            }
        }

        marks.into_spans()
    }
}

impl Default for EntityRecognizer {
    fn default() -> Self {
        Self::english()
    }
}

/// Controle dos tokens já cobertos por alguma entidade
struct Marks {
    taken: Vec<bool>,
    spans: Vec<(Range<usize>, EntityLabel)>,
}

impl Marks {
    fn new(len: usize) -> Self {
        Self { taken: vec![false; len], spans: Vec::new() }
    }

    fn is_marked(&self, i: usize) -> bool {
        self.taken.get(i).copied().unwrap_or(false)
    }

    /// Registra o span se nenhum dos seus tokens estiver marcado
    fn mark(&mut self, range: Range<usize>, label: EntityLabel) {
        if range.is_empty() || range.end > self.taken.len() || range.clone().any(|i| self.taken[i]) {
            return;
        }
        for i in range.clone() {
            self.taken[i] = true;
        }
        self.spans.push((range, label));
    }

    fn into_spans(mut self) -> Vec<(Range<usize>, EntityLabel)> {
        self.spans.sort_by_key(|(range, _)| range.start);
        self.spans
    }
}

fn split_lower(name: &str) -> Vec<String> {
    name.split_whitespace().map(|p| p.to_lowercase()).collect()
}

/// Tamanho do maior n-grama do gazetteer que começa em `words`
fn match_ngram(entries: &[Vec<String>], words: &[String]) -> Option<usize> {
    entries
        .iter()
        .filter(|parts| parts.len() <= words.len() && parts.iter().zip(words).all(|(p, w)| p == w))
        .map(Vec::len)
        .max()
}

fn is_capitalized(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

fn is_proper(token: &AnalyzedToken) -> bool {
    matches!(token.tag.as_str(), "NNP" | "NNPS") && is_capitalized(token.text())
}

fn is_number(token: &AnalyzedToken) -> bool {
    token.tag == "CD" || NUMBER.is_match(token.text())
}

/// Estende um número com palavras de grandeza ("3 million")
fn extend_number(lower: &[String], mut end: usize) -> usize {
    while lower.get(end).is_some_and(|w| MAGNITUDES.contains(&w.as_str())) {
        end += 1;
    }
    end
}

/// Fim da sequência de nomes próprios que começa em `start`
fn proper_run_end(tokens: &[AnalyzedToken], start: usize) -> usize {
    let mut end = start + 1;
    while end < tokens.len() && is_proper(&tokens[end]) {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::tagger;
    use crate::tokenizer::{split_sentences, tokenize};

    fn tagged(text: &str) -> Doc {
        let tokens = tokenize(text);
        let sents = split_sentences(text, &tokens);
        let mut doc = Doc::new(text, tokens, sents);
        tagger::tag(&mut doc, &Lexicon::english());
        doc
    }

    fn entities(text: &str) -> Vec<(String, EntityLabel)> {
        let mut doc = tagged(text);
        EntityRecognizer::english().recognize(&mut doc);
        doc.ents.into_iter().map(|e| (e.text, e.label)).collect()
    }

    #[test]
    fn test_labels() {
        assert_eq!(EntityLabel::Gpe.as_str(), "GPE");
        assert_eq!(EntIob::Begin.as_str(), "B");
        assert_eq!(EntIob::Outside.as_str(), "O");
    }

    #[test]
    fn test_person_by_first_name() {
        let ents = entities("Yesterday John Smith visited Paris.");
        assert!(ents.contains(&("John Smith".to_string(), EntityLabel::Person)));
        assert!(ents.contains(&("Paris".to_string(), EntityLabel::Gpe)));
        assert!(ents.contains(&("Yesterday".to_string(), EntityLabel::Date)));
    }

    #[test]
    fn test_title_pattern() {
        let ents = entities("We met Dr. Zelinsky there.");
        assert_eq!(ents, vec![("Zelinsky".to_string(), EntityLabel::Person)]);
    }

    #[test]
    fn test_org_multiword_and_suffix() {
        let ents = entities("He joined the United Nations and later Acme Corp.");
        assert!(ents.contains(&("United Nations".to_string(), EntityLabel::Org)));
        assert!(ents.contains(&("Acme Corp.".to_string(), EntityLabel::Org)));
    }

    #[test]
    fn test_numeric_entities() {
        let ents = entities("It costs $3.50 and rose 40 % in 2019.");
        assert!(ents.contains(&("$3.50".to_string(), EntityLabel::Money)));
        assert!(ents.contains(&("40 %".to_string(), EntityLabel::Percent)));
        assert!(ents.contains(&("2019".to_string(), EntityLabel::Date)));
    }

    #[test]
    fn test_bio_tags() {
        let mut doc = tagged("John Smith left.");
        EntityRecognizer::english().recognize(&mut doc);
        assert_eq!(doc.tokens[0].ent_iob, EntIob::Begin);
        assert_eq!(doc.tokens[1].ent_iob, EntIob::Inside);
        assert_eq!(doc.tokens[2].ent_iob, EntIob::Outside);
        assert_eq!(doc.tokens[1].ent_type, Some(EntityLabel::Person));
        assert_eq!(doc.tokens[2].ent_type, None);
    }

    #[test]
    fn test_unknown_proper_nouns_are_not_guessed() {
        assert!(entities("Zorblat met Quarnix.").is_empty());
    }
}
