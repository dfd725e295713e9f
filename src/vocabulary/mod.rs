use integeriser::{HashIntegeriser, Integeriser};

/// Integerised handle of a symbol in a `Vocabulary`.
pub type SymId = usize;

/// A surface symbol. Nonterminals carry the antecedent position they select
/// on the target side of a rule, so `[X,0]` and `[X,1]` are distinct
/// symbols with the same label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String, usize),
}

impl Symbol {
    pub fn label(&self) -> &str {
        match *self {
            Symbol::Terminal(ref w) => w,
            Symbol::Nonterminal(ref l, _) => l,
        }
    }
}

/// The symbol resolution interface used during hypothesis formatting.
pub trait SymbolTable {
    /// The surface word or nonterminal label behind an id.
    fn word_of(&self, id: SymId) -> Option<&str>;
    fn is_nonterminal(&self, id: SymId) -> bool;
    /// For a target-side nonterminal, the antecedent position it selects.
    fn target_nonterminal_index(&self, id: SymId) -> Option<usize>;
    /// Interns a nonterminal with antecedent position `0` and returns its id.
    fn add_nonterminal(&mut self, label: &str) -> SymId;
}

/// Maps symbols to contiguous `SymId`s, both ways.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    symbols: HashIntegeriser<Symbol>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary::new()
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary {
            symbols: HashIntegeriser::new(),
        }
    }

    pub fn add_terminal(&mut self, word: &str) -> SymId {
        self.symbols.integerise(Symbol::Terminal(word.to_owned()))
    }

    pub fn add_nonterminal_at(&mut self, label: &str, index: usize) -> SymId {
        self.symbols
            .integerise(Symbol::Nonterminal(label.to_owned(), index))
    }

    pub fn intern(&mut self, symbol: Symbol) -> SymId {
        self.symbols.integerise(symbol)
    }

    pub fn find(&self, symbol: &Symbol) -> Option<SymId> {
        self.symbols.find_key(symbol)
    }

    pub fn size(&self) -> usize {
        self.symbols.size()
    }
}

impl SymbolTable for Vocabulary {
    fn word_of(&self, id: SymId) -> Option<&str> {
        self.symbols.find_value(id).map(Symbol::label)
    }

    fn is_nonterminal(&self, id: SymId) -> bool {
        match self.symbols.find_value(id) {
            Some(&Symbol::Nonterminal(_, _)) => true,
            _ => false,
        }
    }

    fn target_nonterminal_index(&self, id: SymId) -> Option<usize> {
        match self.symbols.find_value(id) {
            Some(&Symbol::Nonterminal(_, index)) => Some(index),
            _ => None,
        }
    }

    fn add_nonterminal(&mut self, label: &str) -> SymId {
        self.add_nonterminal_at(label, 0)
    }
}
