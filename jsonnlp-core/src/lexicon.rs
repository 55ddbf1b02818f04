//! # Léxico do Inglês
//!
//! Conhecimento estático usado pelo etiquetador e pelo lematizador:
//!
//! - **Mapa de tags** ([`TAG_MAP`]): para cada tag Penn Treebank, a classe
//!   gramatical universal (primeira entrada, chave `POS`) seguida dos traços
//!   morfológicos (ex: `VBZ` → `VerbForm=fin`, `Tense=pres`, `Number=sing`, `Person=3`).
//! - **Palavras de classe fechada**: determinantes, preposições, pronomes, modais...
//! - **Verbos irregulares**, bases verbais e adjetivos conhecidos.
//! - **Stop words**.
//!
//! O [`Lexicon`] é construído uma única vez quando o modelo é carregado e depois
//! só é lido, por isso pode ser compartilhado entre threads sem trava.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Classe gramatical universal (Universal Dependencies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Upos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Space,
    Sym,
    Verb,
    X,
}

impl Upos {
    /// Nome da classe como aparece no JSON (ex: "NOUN")
    pub fn as_str(&self) -> &'static str {
        match self {
            Upos::Adj => "ADJ",
            Upos::Adp => "ADP",
            Upos::Adv => "ADV",
            Upos::Aux => "AUX",
            Upos::Cconj => "CCONJ",
            Upos::Det => "DET",
            Upos::Intj => "INTJ",
            Upos::Noun => "NOUN",
            Upos::Num => "NUM",
            Upos::Part => "PART",
            Upos::Pron => "PRON",
            Upos::Propn => "PROPN",
            Upos::Punct => "PUNCT",
            Upos::Sconj => "SCONJ",
            Upos::Space => "SPACE",
            Upos::Sym => "SYM",
            Upos::Verb => "VERB",
            Upos::X => "X",
        }
    }

    /// Tenta parsear a partir do nome (ex: "PROPN" → Some(Propn))
    pub fn from_name(name: &str) -> Option<Self> {
        let upos = match name {
            "ADJ" => Upos::Adj,
            "ADP" => Upos::Adp,
            "ADV" => Upos::Adv,
            "AUX" => Upos::Aux,
            "CCONJ" => Upos::Cconj,
            "DET" => Upos::Det,
            "INTJ" => Upos::Intj,
            "NOUN" => Upos::Noun,
            "NUM" => Upos::Num,
            "PART" => Upos::Part,
            "PRON" => Upos::Pron,
            "PROPN" => Upos::Propn,
            "PUNCT" => Upos::Punct,
            "SCONJ" => Upos::Sconj,
            "SPACE" => Upos::Space,
            "SYM" => Upos::Sym,
            "VERB" => Upos::Verb,
            "X" => Upos::X,
            _ => return None,
        };
        Some(upos)
    }

    /// Classe universal de uma tag Penn, lida da entrada primária do mapa de tags
    pub fn from_tag(tag: &str) -> Self {
        tag_entry(tag)
            .and_then(|features| features.first())
            .and_then(|(_, name)| Upos::from_name(name))
            .unwrap_or(Upos::X)
    }

    /// Classes que podem ser núcleo de um sintagma nominal
    pub fn is_nominal(&self) -> bool {
        matches!(self, Upos::Noun | Upos::Propn | Upos::Pron)
    }
}

impl std::fmt::Display for Upos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapa tag Penn → traços. A primeira entrada de cada tag é sempre a classe
/// universal (`POS`); as demais são traços morfológicos.
pub const TAG_MAP: &[(&str, &[(&str, &str)])] = &[
    (".", &[("POS", "PUNCT"), ("PunctType", "peri")]),
    (",", &[("POS", "PUNCT"), ("PunctType", "comm")]),
    ("-LRB-", &[("POS", "PUNCT"), ("PunctType", "brck"), ("PunctSide", "ini")]),
    ("-RRB-", &[("POS", "PUNCT"), ("PunctType", "brck"), ("PunctSide", "fin")]),
    ("``", &[("POS", "PUNCT"), ("PunctType", "quot"), ("PunctSide", "ini")]),
    ("''", &[("POS", "PUNCT"), ("PunctType", "quot"), ("PunctSide", "fin")]),
    (":", &[("POS", "PUNCT")]),
    ("$", &[("POS", "SYM"), ("SymType", "currency")]),
    ("#", &[("POS", "SYM"), ("SymType", "numbersign")]),
    ("AFX", &[("POS", "ADJ"), ("Hyph", "yes")]),
    ("CC", &[("POS", "CCONJ"), ("ConjType", "coor")]),
    ("CD", &[("POS", "NUM"), ("NumType", "card")]),
    ("DT", &[("POS", "DET")]),
    ("EX", &[("POS", "ADV"), ("AdvType", "ex")]),
    ("FW", &[("POS", "X"), ("Foreign", "yes")]),
    ("HYPH", &[("POS", "PUNCT"), ("PunctType", "dash")]),
    ("IN", &[("POS", "ADP")]),
    ("JJ", &[("POS", "ADJ"), ("Degree", "pos")]),
    ("JJR", &[("POS", "ADJ"), ("Degree", "comp")]),
    ("JJS", &[("POS", "ADJ"), ("Degree", "sup")]),
    ("LS", &[("POS", "PUNCT"), ("NumType", "ord")]),
    ("MD", &[("POS", "VERB"), ("VerbType", "mod")]),
    ("NN", &[("POS", "NOUN"), ("Number", "sing")]),
    ("NNP", &[("POS", "PROPN"), ("NounType", "prop"), ("Number", "sing")]),
    ("NNPS", &[("POS", "PROPN"), ("NounType", "prop"), ("Number", "plur")]),
    ("NNS", &[("POS", "NOUN"), ("Number", "plur")]),
    ("PDT", &[("POS", "ADJ"), ("AdjType", "pdt"), ("PronType", "prn")]),
    ("POS", &[("POS", "PART"), ("Poss", "yes")]),
    ("PRP", &[("POS", "PRON"), ("PronType", "prs")]),
    ("PRP$", &[("POS", "ADJ"), ("PronType", "prs"), ("Poss", "yes")]),
    ("RB", &[("POS", "ADV"), ("Degree", "pos")]),
    ("RBR", &[("POS", "ADV"), ("Degree", "comp")]),
    ("RBS", &[("POS", "ADV"), ("Degree", "sup")]),
    ("RP", &[("POS", "PART")]),
    ("SP", &[("POS", "SPACE")]),
    ("SYM", &[("POS", "SYM")]),
    ("TO", &[("POS", "PART"), ("PartType", "inf"), ("VerbForm", "inf")]),
    ("UH", &[("POS", "INTJ")]),
    ("VB", &[("POS", "VERB"), ("VerbForm", "inf")]),
    ("VBD", &[("POS", "VERB"), ("VerbForm", "fin"), ("Tense", "past")]),
    ("VBG", &[("POS", "VERB"), ("VerbForm", "part"), ("Tense", "pres"), ("Aspect", "prog")]),
    ("VBN", &[("POS", "VERB"), ("VerbForm", "part"), ("Tense", "past"), ("Aspect", "perf")]),
    ("VBP", &[("POS", "VERB"), ("VerbForm", "fin"), ("Tense", "pres")]),
    (
        "VBZ",
        &[("POS", "VERB"), ("VerbForm", "fin"), ("Tense", "pres"), ("Number", "sing"), ("Person", "3")],
    ),
    ("WDT", &[("POS", "ADJ"), ("PronType", "int|rel")]),
    ("WP", &[("POS", "NOUN"), ("PronType", "int|rel")]),
    ("WP$", &[("POS", "ADJ"), ("Poss", "yes"), ("PronType", "int|rel")]),
    ("WRB", &[("POS", "ADV"), ("PronType", "int|rel")]),
    ("XX", &[("POS", "X")]),
    ("NFP", &[("POS", "PUNCT")]),
];

/// Busca a entrada de uma tag no mapa
pub fn tag_entry(tag: &str) -> Option<&'static [(&'static str, &'static str)]> {
    TAG_MAP.iter().find(|(t, _)| *t == tag).map(|(_, features)| *features)
}

/// Traços morfológicos de uma tag, sem a entrada primária e com valores em title case.
///
/// `VBZ` → `[("VerbForm", "Fin"), ("Tense", "Pres"), ("Number", "Sing"), ("Person", "3")]`
pub fn morph_features(tag: &str) -> Vec<(&'static str, String)> {
    tag_entry(tag)
        .map(|features| {
            features
                .iter()
                .skip(1)
                .map(|(key, value)| (*key, titlecase(value)))
                .collect()
        })
        .unwrap_or_default()
}

/// Title case no estilo "cada sequência de letras começa com maiúscula"
/// (ex: "sing" → "Sing", "int|rel" → "Int|Rel").
pub fn titlecase(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Palavras de classe fechada com sua tag padrão (ambiguidades são resolvidas pelo etiquetador)
const CLOSED_CLASS: &[(&str, &str)] = &[
    // Determinantes
    ("the", "DT"), ("a", "DT"), ("an", "DT"), ("this", "DT"), ("these", "DT"),
    ("those", "DT"), ("that", "DT"), ("every", "DT"), ("each", "DT"), ("some", "DT"),
    ("any", "DT"), ("no", "DT"), ("all", "DT"), ("both", "DT"), ("either", "DT"),
    ("neither", "DT"), ("another", "DT"),
    // Pronomes pessoais e possessivos
    ("i", "PRP"), ("me", "PRP"), ("you", "PRP"), ("he", "PRP"), ("him", "PRP"),
    ("she", "PRP"), ("her", "PRP"), ("it", "PRP"), ("we", "PRP"), ("us", "PRP"),
    ("they", "PRP"), ("them", "PRP"), ("myself", "PRP"), ("yourself", "PRP"),
    ("himself", "PRP"), ("herself", "PRP"), ("itself", "PRP"), ("ourselves", "PRP"),
    ("yourselves", "PRP"), ("themselves", "PRP"), ("mine", "PRP"), ("yours", "PRP"),
    ("hers", "PRP"), ("ours", "PRP"), ("theirs", "PRP"),
    ("my", "PRP$"), ("your", "PRP$"), ("his", "PRP$"), ("its", "PRP$"), ("our", "PRP$"),
    ("their", "PRP$"),
    // Interrogativos e relativos
    ("who", "WP"), ("whom", "WP"), ("what", "WP"), ("whoever", "WP"), ("whatever", "WP"),
    ("whose", "WP$"), ("which", "WDT"), ("whichever", "WDT"),
    ("when", "WRB"), ("where", "WRB"), ("why", "WRB"), ("how", "WRB"),
    ("whenever", "WRB"), ("wherever", "WRB"),
    // Preposições e conjunções subordinativas
    ("of", "IN"), ("in", "IN"), ("on", "IN"), ("at", "IN"), ("by", "IN"), ("for", "IN"),
    ("with", "IN"), ("from", "IN"), ("into", "IN"), ("onto", "IN"), ("over", "IN"),
    ("under", "IN"), ("about", "IN"), ("above", "IN"), ("across", "IN"), ("after", "IN"),
    ("against", "IN"), ("along", "IN"), ("among", "IN"), ("around", "IN"), ("before", "IN"),
    ("behind", "IN"), ("below", "IN"), ("beneath", "IN"), ("beside", "IN"),
    ("between", "IN"), ("beyond", "IN"), ("despite", "IN"), ("during", "IN"),
    ("except", "IN"), ("inside", "IN"), ("near", "IN"), ("off", "IN"), ("out", "IN"),
    ("outside", "IN"), ("since", "IN"), ("through", "IN"), ("throughout", "IN"),
    ("toward", "IN"), ("towards", "IN"), ("until", "IN"), ("up", "IN"), ("upon", "IN"),
    ("within", "IN"), ("without", "IN"), ("via", "IN"), ("like", "IN"), ("than", "IN"),
    ("as", "IN"), ("because", "IN"), ("if", "IN"), ("while", "IN"), ("although", "IN"),
    ("though", "IN"), ("unless", "IN"), ("whether", "IN"), ("whereas", "IN"), ("per", "IN"),
    ("down", "IN"),
    ("to", "TO"),
    // Conjunções coordenativas
    ("and", "CC"), ("or", "CC"), ("but", "CC"), ("nor", "CC"), ("yet", "CC"), ("plus", "CC"),
    ("&", "CC"),
    // Modais (incluindo as formas que sobram das contrações "can't", "won't")
    ("can", "MD"), ("could", "MD"), ("may", "MD"), ("might", "MD"), ("must", "MD"),
    ("shall", "MD"), ("should", "MD"), ("will", "MD"), ("would", "MD"), ("'ll", "MD"),
    ("'d", "MD"), ("ca", "MD"), ("wo", "MD"), ("sha", "MD"),
    // Advérbios frequentes
    ("not", "RB"), ("n't", "RB"), ("never", "RB"), ("very", "RB"), ("also", "RB"),
    ("just", "RB"), ("only", "RB"), ("still", "RB"), ("already", "RB"), ("always", "RB"),
    ("often", "RB"), ("sometimes", "RB"), ("usually", "RB"), ("quite", "RB"), ("too", "RB"),
    ("really", "RB"), ("almost", "RB"), ("soon", "RB"), ("now", "RB"), ("then", "RB"),
    ("here", "RB"), ("there", "RB"), ("again", "RB"), ("ever", "RB"), ("even", "RB"),
    ("well", "RB"), ("rather", "RB"), ("perhaps", "RB"), ("maybe", "RB"), ("however", "RB"),
    ("therefore", "RB"), ("so", "RB"), ("once", "RB"), ("away", "RB"), ("back", "RB"),
    ("together", "RB"), ("instead", "RB"), ("else", "RB"),
    ("more", "JJR"), ("less", "JJR"), ("most", "JJS"), ("least", "JJS"),
    // Interjeições
    ("oh", "UH"), ("ah", "UH"), ("hello", "UH"), ("hi", "UH"), ("hey", "UH"), ("wow", "UH"),
    ("yes", "UH"), ("okay", "UH"), ("ok", "UH"), ("please", "UH"), ("thanks", "UH"),
    // Numerais por extenso
    ("zero", "CD"), ("one", "CD"), ("two", "CD"), ("three", "CD"), ("four", "CD"),
    ("five", "CD"), ("six", "CD"), ("seven", "CD"), ("eight", "CD"), ("nine", "CD"),
    ("ten", "CD"), ("eleven", "CD"), ("twelve", "CD"), ("twenty", "CD"), ("thirty", "CD"),
    ("forty", "CD"), ("fifty", "CD"), ("hundred", "CD"), ("thousand", "CD"),
    ("million", "CD"), ("billion", "CD"), ("dozen", "CD"),
];

/// Formas irregulares de verbos: forma → (lema, tag padrão)
const IRREGULAR_VERBS: &[(&str, &str, &str)] = &[
    ("be", "be", "VB"), ("am", "be", "VBP"), ("is", "be", "VBZ"), ("are", "be", "VBP"),
    ("was", "be", "VBD"), ("were", "be", "VBD"), ("been", "be", "VBN"), ("being", "be", "VBG"),
    ("'re", "be", "VBP"), ("'m", "be", "VBP"),
    ("have", "have", "VBP"), ("has", "have", "VBZ"), ("had", "have", "VBD"),
    ("having", "have", "VBG"), ("'ve", "have", "VBP"),
    ("do", "do", "VBP"), ("does", "do", "VBZ"), ("did", "do", "VBD"), ("done", "do", "VBN"),
    ("doing", "do", "VBG"),
    ("went", "go", "VBD"), ("gone", "go", "VBN"), ("goes", "go", "VBZ"),
    ("saw", "see", "VBD"), ("seen", "see", "VBN"), ("said", "say", "VBD"),
    ("made", "make", "VBD"), ("took", "take", "VBD"), ("taken", "take", "VBN"),
    ("got", "get", "VBD"), ("gotten", "get", "VBN"), ("gave", "give", "VBD"),
    ("given", "give", "VBN"), ("knew", "know", "VBD"), ("known", "know", "VBN"),
    ("thought", "think", "VBD"), ("found", "find", "VBD"), ("told", "tell", "VBD"),
    ("felt", "feel", "VBD"), ("left", "leave", "VBD"), ("kept", "keep", "VBD"),
    ("began", "begin", "VBD"), ("begun", "begin", "VBN"), ("brought", "bring", "VBD"),
    ("wrote", "write", "VBD"), ("written", "write", "VBN"), ("sat", "sit", "VBD"),
    ("stood", "stand", "VBD"), ("lost", "lose", "VBD"), ("paid", "pay", "VBD"),
    ("met", "meet", "VBD"), ("led", "lead", "VBD"), ("understood", "understand", "VBD"),
    ("spoke", "speak", "VBD"), ("spoken", "speak", "VBN"), ("spent", "spend", "VBD"),
    ("grew", "grow", "VBD"), ("grown", "grow", "VBN"), ("won", "win", "VBD"),
    ("taught", "teach", "VBD"), ("bought", "buy", "VBD"), ("sent", "send", "VBD"),
    ("built", "build", "VBD"), ("fell", "fall", "VBD"), ("fallen", "fall", "VBN"),
    ("ran", "run", "VBD"), ("came", "come", "VBD"), ("became", "become", "VBD"),
    ("ate", "eat", "VBD"), ("eaten", "eat", "VBN"), ("caught", "catch", "VBD"),
    ("drew", "draw", "VBD"), ("drawn", "draw", "VBN"), ("chose", "choose", "VBD"),
    ("chosen", "choose", "VBN"), ("slept", "sleep", "VBD"), ("meant", "mean", "VBD"),
    ("heard", "hear", "VBD"), ("held", "hold", "VBD"), ("broke", "break", "VBD"),
    ("broken", "break", "VBN"), ("drove", "drive", "VBD"), ("driven", "drive", "VBN"),
    ("flew", "fly", "VBD"), ("flown", "fly", "VBN"), ("swam", "swim", "VBD"),
    ("sang", "sing", "VBD"), ("sung", "sing", "VBN"), ("wore", "wear", "VBD"),
    ("worn", "wear", "VBN"), ("sold", "sell", "VBD"), ("rode", "ride", "VBD"),
    ("ridden", "ride", "VBN"), ("threw", "throw", "VBD"), ("thrown", "throw", "VBN"),
    ("forgot", "forget", "VBD"), ("forgotten", "forget", "VBN"), ("hid", "hide", "VBD"),
    ("hidden", "hide", "VBN"), ("shook", "shake", "VBD"), ("stole", "steal", "VBD"),
    ("stolen", "steal", "VBN"), ("woke", "wake", "VBD"), ("fought", "fight", "VBD"),
    ("sought", "seek", "VBD"), ("fed", "feed", "VBD"), ("fled", "flee", "VBD"),
    ("bit", "bite", "VBD"), ("bitten", "bite", "VBN"), ("rose", "rise", "VBD"),
    ("risen", "rise", "VBN"), ("struck", "strike", "VBD"), ("shot", "shoot", "VBD"),
];

/// Plurais irregulares: plural → singular
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("men", "man"), ("women", "woman"), ("children", "child"), ("people", "person"),
    ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("geese", "goose"),
    ("lives", "life"), ("wives", "wife"), ("knives", "knife"), ("leaves", "leaf"),
    ("wolves", "wolf"), ("halves", "half"), ("data", "datum"), ("criteria", "criterion"),
];

/// Bases verbais conhecidas (desambiguam "jumps" verbo de "jumps" substantivo e
/// orientam a lematização de formas regulares)
const VERB_BASES: &[&str] = &[
    "go", "come", "see", "say", "make", "take", "get", "give", "know", "think", "look",
    "want", "use", "find", "tell", "ask", "work", "seem", "feel", "try", "leave", "call",
    "keep", "let", "begin", "help", "show", "hear", "play", "run", "move", "live",
    "believe", "bring", "happen", "write", "sit", "stand", "lose", "pay", "meet",
    "include", "continue", "set", "learn", "change", "lead", "understand", "watch",
    "follow", "stop", "create", "speak", "read", "spend", "grow", "open", "walk", "win",
    "teach", "offer", "remember", "consider", "appear", "buy", "serve", "die", "send",
    "build", "stay", "fall", "cut", "reach", "kill", "raise", "pass", "sell", "decide",
    "return", "explain", "hope", "develop", "carry", "break", "receive", "agree",
    "support", "hit", "produce", "eat", "cover", "catch", "draw", "choose", "jump",
    "sleep", "love", "like", "need", "put", "mean", "become", "start", "turn", "bark",
    "chase", "sing", "drive", "fly", "swim", "wear", "visit", "arrive", "announce",
    "acquire", "hate", "plan", "travel", "study", "cry", "marry", "worry", "close",
    "join", "add", "wait", "talk", "listen", "answer", "finish", "launch", "release",
    "report", "claim", "expect", "increase", "rise", "fight", "throw", "forget",
    "hide", "shake", "steal", "wake", "seek", "feed", "flee", "bite", "strike", "shoot",
    "ride", "hold", "invest", "hire", "fire", "sign", "own",
    "beat", "thank", "prefer", "admit", "drop", "shop", "chat", "hug", "nod",
];

/// Adjetivos conhecidos
const ADJECTIVES: &[&str] = &[
    "good", "bad", "big", "small", "large", "little", "old", "new", "young", "long",
    "short", "high", "low", "great", "quick", "slow", "brown", "lazy", "red", "blue",
    "green", "black", "white", "yellow", "happy", "sad", "important", "different",
    "same", "other", "first", "last", "next", "few", "many", "much", "own", "early",
    "late", "hot", "cold", "easy", "hard", "strong", "weak", "beautiful", "nice",
    "free", "full", "sure", "true", "real", "whole", "public", "private", "local",
    "national", "major", "main", "best", "better", "worse", "worst", "fast", "tall",
    "rich", "poor", "clean", "dark", "bright", "huge", "tiny", "busy", "angry",
    "tired", "hungry", "sick", "famous", "popular", "smart", "wise", "kind", "fine",
    "open", "able", "such", "several", "various", "possible", "likely", "ready",
    "simple", "common", "recent", "final", "social", "human", "natural", "similar",
];

/// Stop words (lista compacta no estilo das listas de bibliotecas de NLP)
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "also",
    "although", "always", "am", "among", "an", "and", "another", "any", "are", "around",
    "as", "at", "back", "be", "became", "because", "become", "been", "before", "being",
    "below", "between", "both", "but", "by", "ca", "can", "could", "did", "do", "does",
    "doing", "done", "down", "during", "each", "either", "else", "even", "ever", "every",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into",
    "is", "it", "its", "itself", "just", "last", "least", "less", "made", "many", "may",
    "me", "might", "mine", "more", "most", "much", "must", "my", "myself", "neither",
    "never", "no", "nor", "not", "n't", "now", "of", "off", "often", "on", "once", "one",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "per",
    "perhaps", "please", "quite", "rather", "really", "'re", "'s", "same", "say", "see",
    "several", "she", "should", "since", "so", "some", "still", "such", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "though", "through", "to", "together", "too", "toward", "towards",
    "under", "until", "up", "upon", "us", "used", "very", "via", "was", "we", "well",
    "were", "what", "whatever", "when", "whenever", "where", "wherever", "whether",
    "which", "while", "who", "whoever", "whom", "whose", "why", "will", "with", "within",
    "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves", "'ll",
    "'ve", "'d", "'m", "wo", "sha",
];

/// Pronomes pessoais cujo lema é o marcador `-PRON-`
const PERSONAL_PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
    "we", "us", "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves",
];

/// Lemas explícitos de formas reduzidas
const REDUCED_FORMS: &[(&str, &str)] = &[
    ("ca", "can"), ("wo", "will"), ("sha", "shall"), ("'ll", "will"), ("'d", "would"),
    ("n't", "not"), ("'re", "be"), ("'m", "be"), ("'ve", "have"),
];

/// Comparativos e superlativos irregulares
const IRREGULAR_ADJECTIVES: &[(&str, &str)] = &[
    ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
];

/// Léxico do inglês carregado em memória.
#[derive(Debug, Clone)]
pub struct Lexicon {
    closed_class: HashMap<&'static str, &'static str>,
    irregular_verbs: HashMap<&'static str, (&'static str, &'static str)>,
    irregular_nouns: HashMap<&'static str, &'static str>,
    verb_bases: HashSet<&'static str>,
    adjectives: HashSet<&'static str>,
    stop_words: HashSet<&'static str>,
}

impl Lexicon {
    /// Constrói o léxico a partir das tabelas estáticas.
    pub fn english() -> Self {
        Self {
            closed_class: CLOSED_CLASS.iter().copied().collect(),
            irregular_verbs: IRREGULAR_VERBS
                .iter()
                .map(|(form, lemma, tag)| (*form, (*lemma, *tag)))
                .collect(),
            irregular_nouns: IRREGULAR_NOUNS.iter().copied().collect(),
            verb_bases: VERB_BASES.iter().copied().collect(),
            adjectives: ADJECTIVES.iter().copied().collect(),
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Número de entradas (usado nos logs de carregamento)
    pub fn len(&self) -> usize {
        self.closed_class.len()
            + self.irregular_verbs.len()
            + self.irregular_nouns.len()
            + self.verb_bases.len()
            + self.adjectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tag padrão de uma palavra de classe fechada (chave em minúsculas)
    pub fn closed_class(&self, lower: &str) -> Option<&'static str> {
        self.closed_class.get(lower).copied()
    }

    /// (lema, tag) de uma forma verbal irregular
    pub fn irregular_verb(&self, lower: &str) -> Option<(&'static str, &'static str)> {
        self.irregular_verbs.get(lower).copied()
    }

    pub fn is_verb_base(&self, lower: &str) -> bool {
        self.verb_bases.contains(lower)
    }

    pub fn is_adjective(&self, lower: &str) -> bool {
        self.adjectives.contains(lower)
    }

    pub fn is_stop(&self, lower: &str) -> bool {
        self.stop_words.contains(lower)
    }

    /// Lema de uma palavra dada sua tag Penn.
    pub fn lemmatize(&self, text: &str, tag: &str) -> String {
        let lower = text.to_lowercase();
        if let Some((_, lemma)) = REDUCED_FORMS.iter().find(|(form, _)| *form == lower) {
            return lemma.to_string();
        }
        match tag {
            "PRP" | "PRP$" if PERSONAL_PRONOUNS.contains(&lower.as_str()) => "-PRON-".to_string(),
            "NNP" | "NNPS" => text.to_string(),
            "VBZ" if lower == "'s" || lower == "\u{2019}s" => "be".to_string(),
            "NNS" => self.noun_lemma(&lower),
            "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => self.verb_lemma(&lower),
            "JJR" | "JJS" | "RBR" | "RBS" => self.adjective_lemma(&lower),
            _ => lower,
        }
    }

    /// Singular de um substantivo no plural
    pub fn noun_lemma(&self, lower: &str) -> String {
        if let Some(singular) = self.irregular_nouns.get(lower) {
            return singular.to_string();
        }
        if lower.len() > 4 {
            if let Some(stem) = lower.strip_suffix("ies") {
                return format!("{stem}y");
            }
        }
        for suffix in ["ses", "xes", "zes", "ches", "shes"] {
            if lower.ends_with(suffix) {
                return lower[..lower.len() - 2].to_string();
            }
        }
        if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
            return lower.to_string();
        }
        lower.strip_suffix('s').unwrap_or(lower).to_string()
    }

    /// Forma base de um verbo flexionado
    pub fn verb_lemma(&self, lower: &str) -> String {
        if let Some((lemma, _)) = self.irregular_verb(lower) {
            return lemma.to_string();
        }
        if self.is_verb_base(lower) {
            return lower.to_string();
        }
        if lower.len() > 4 {
            if let Some(stem) = lower.strip_suffix("ies").or_else(|| lower.strip_suffix("ied")) {
                return format!("{stem}y");
            }
        }
        if let Some(stem) = lower.strip_suffix("ing").filter(|s| s.len() > 1) {
            return self.pick_verb_stem(stem);
        }
        if let Some(stem) = lower.strip_suffix("ed").filter(|s| s.len() > 1) {
            return self.pick_verb_stem(stem);
        }
        if let Some(stem) = lower.strip_suffix("es") {
            if self.is_verb_base(stem) {
                return stem.to_string();
            }
            let e_stem = &lower[..lower.len() - 1];
            if self.is_verb_base(e_stem) {
                return e_stem.to_string();
            }
            if ["s", "x", "z", "ch", "sh", "o"].iter().any(|s| stem.ends_with(s)) {
                return stem.to_string();
            }
            return e_stem.to_string();
        }
        if !lower.ends_with("ss") {
            if let Some(stem) = lower.strip_suffix('s') {
                return stem.to_string();
            }
        }
        lower.to_string()
    }

    /// Escolhe entre "stem", "stem+e" e o stem sem consoante dobrada
    /// ("walk" de "walked", "like" de "liked", "stop" de "stopped")
    fn pick_verb_stem(&self, stem: &str) -> String {
        let with_e = format!("{stem}e");
        let undoubled = undouble(stem);
        if self.is_verb_base(stem) {
            return stem.to_string();
        }
        if self.is_verb_base(&with_e) {
            return with_e;
        }
        if let Some(undoubled) = undoubled {
            return undoubled.to_string();
        }
        stem.to_string()
    }

    /// Forma positiva de um comparativo/superlativo
    pub fn adjective_lemma(&self, lower: &str) -> String {
        if let Some((_, lemma)) = IRREGULAR_ADJECTIVES.iter().find(|(form, _)| *form == lower) {
            return lemma.to_string();
        }
        if self.is_adjective(lower) || matches!(lower, "more" | "most" | "less" | "least") {
            return lower.to_string();
        }
        let stem = lower
            .strip_suffix("iest")
            .or_else(|| lower.strip_suffix("ier"))
            .map(|s| format!("{s}y"));
        if let Some(stem) = stem {
            return stem;
        }
        let stem = lower
            .strip_suffix("est")
            .or_else(|| lower.strip_suffix("er"))
            .unwrap_or(lower);
        if self.is_adjective(stem) {
            return stem.to_string();
        }
        let with_e = format!("{stem}e");
        if self.is_adjective(&with_e) {
            return with_e;
        }
        undouble(stem).unwrap_or(stem).to_string()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::english()
    }
}

/// Remove a última consoante se ela estiver dobrada ("stopp" → "stop")
fn undouble(stem: &str) -> Option<&str> {
    let mut rev = stem.chars().rev();
    let (last, prev) = (rev.next()?, rev.next()?);
    let doubled = last == prev && !"aeiouslz".contains(last) && last.is_ascii_alphabetic();
    doubled.then(|| &stem[..stem.len() - last.len_utf8()])
}
