//! Analysis layer over [`cal_syntax`]: symbol tables, folding ranges and
//! semantic tokens, bundled behind the [`Analysis`] one-stop entry.
//!
//! # Example
//!
//! ```
//! use cal_analysis::Analysis;
//!
//! let analysis = Analysis::new(
//!     "OBJECT Codeunit 50000 Demo { CODE { PROCEDURE Run@1(); BEGIN END; BEGIN END. } }",
//! );
//! assert!(analysis.is_valid());
//! assert!(analysis.symbol_table().get("Run").is_some());
//! ```

pub mod folding;
pub mod semantic_tokens;
pub mod symbols;


pub use folding::{FoldingRange, FoldingRangeKind, folding_ranges};
pub use semantic_tokens::{
    SemanticToken, SemanticTokenModifiers, SemanticTokenSink, SemanticTokenType,
    SemanticTokensBuilder, semantic_tokens,
};
pub use symbols::{ScopeId, ScopeKind, Symbol, SymbolKind, SymbolTable};

use cal_syntax::ast::CalDocument;
use cal_syntax::ast::visit::NodeRef;
use cal_syntax::lexer::{CleanExitReport, LexOptions, Lexer};
use cal_syntax::parser::{ParseError, parse};
use cal_syntax::token::Token;
use cal_syntax::{Diagnostic, DepthLimitedWalker, NullVisitor};

/// Options for one analysis batch.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Forwarded to the lexer; suppresses only the CONTEXT_UNDERFLOW
    /// violation.
    pub allow_rdldata_underflow: bool,
    /// Logical nesting-depth limit for the diagnostics walk; `None` keeps
    /// the default.
    pub max_nesting_depth: Option<u32>,
}

/// One analysis pass over one source buffer: lex + parse happen in `new`,
/// everything else derives from the stored results. Instances share no
/// state; independent analyses can run concurrently.
pub struct Analysis {
    source: String,
    tokens: Vec<Token>,
    clean_exit: CleanExitReport,
    document: CalDocument,
    errors: Vec<ParseError>,
    options: AnalysisOptions,
}

impl Analysis {
    pub fn new(source: &str) -> Self {
        Self::with_options(source, AnalysisOptions::default())
    }

    pub fn with_options(source: &str, options: AnalysisOptions) -> Self {
        let mut lexer = Lexer::with_options(LexOptions {
            trace: None,
            allow_rdldata_underflow: options.allow_rdldata_underflow,
        });
        let (tokens, clean_exit) = lexer.tokenize(source);
        let (document, errors) = parse(tokens.clone());
        Self {
            source: source.to_string(),
            tokens,
            clean_exit,
            document,
            errors,
            options,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn document(&self) -> &CalDocument {
        &self.document
    }

    pub fn clean_exit(&self) -> &CleanExitReport {
        &self.clean_exit
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Clean lexer exit and no parse errors.
    pub fn is_valid(&self) -> bool {
        self.clean_exit.passed && self.errors.is_empty()
    }

    /// Every boundary diagnostic of the pass: clean-exit violations, parse
    /// errors, and nesting-depth warnings from a depth-limited walk.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.clean_exit.to_diagnostics();
        diagnostics.extend(self.errors.iter().map(ParseError::to_diagnostic));
        let mut walker = match self.options.max_nesting_depth {
            Some(limit) => DepthLimitedWalker::with_max_depth(limit),
            None => DepthLimitedWalker::new(),
        };
        walker.walk(NodeRef::Document(&self.document), &mut NullVisitor);
        diagnostics.extend(walker.diagnostics().iter().cloned());
        diagnostics
    }

    pub fn symbol_table(&self) -> SymbolTable {
        SymbolTable::build(&self.document)
    }

    pub fn folding_ranges(&self) -> Vec<FoldingRange> {
        folding_ranges(&self.document, &self.source)
    }

    pub fn semantic_tokens(&self, sink: &mut dyn SemanticTokenSink) {
        semantic_tokens(&self.tokens, &self.document, sink)
    }
}
