//! TypeScript declaration parser using SWC
//!
//! Global invariants enforced:
//! - Deterministic parsing order
//! - Byte offsets into the original text are recoverable for every node

use anyhow::Result;
use swc_common::{sync::Lrc, BytePos, FileName, SourceFile, SourceMap, Span};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// Declaration files are always parsed in ambient (dts) mode
fn declaration_syntax() -> Syntax {
    Syntax::Typescript(swc_ecma_parser::TsSyntax {
        tsx: false, // Declarations never contain JSX
        decorators: false, // No experimental decorators
        dts: true, // Body-less functions and ambient namespaces
        ..Default::default()
    })
}

/// A parsed declaration file together with the text it was parsed from
pub struct ParsedDeclarations {
    pub module: Module,
    pub source_file: Lrc<SourceFile>,
    /// Messages for errors the parser recovered from
    pub recovered: Vec<String>,
}

impl ParsedDeclarations {
    /// Original source text
    pub fn source(&self) -> &str {
        &self.source_file.src
    }

    /// Convert an absolute position into a byte offset within this file
    pub fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.source_file.start_pos.0) as usize
    }

    /// Byte range of a span within this file
    pub fn range(&self, span: Span) -> std::ops::Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }

    /// Source text covered by a span
    pub fn text(&self, span: Span) -> &str {
        let range = self.range(span);
        self.source().get(range).unwrap_or("")
    }
}

/// Parse TypeScript declaration source into an AST module
///
/// Returns an error if a fatal parse error occurs. Recoverable errors are
/// returned alongside the module.
pub fn parse_declarations(
    src: &str,
    source_map: &Lrc<SourceMap>,
    filename: &str,
) -> Result<ParsedDeclarations> {
    let source_file: Lrc<SourceFile> = source_map.new_source_file(
        FileName::Custom(filename.into()).into(),
        src.to_string(),
    );

    let input = StringInput::from(&*source_file);

    let lexer = Lexer::new(declaration_syntax(), EsVersion::Es2022, input, None);

    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        let error_msg = e.kind().msg();
        anyhow::Error::new(crate::error::TransformError::Parse {
            file: filename.to_string(),
            message: error_msg.to_string(),
        })
    })?;

    let recovered = parser
        .take_errors()
        .into_iter()
        .map(|e| e.kind().msg().to_string())
        .collect();

    Ok(ParsedDeclarations {
        module,
        source_file,
        recovered,
    })
}
