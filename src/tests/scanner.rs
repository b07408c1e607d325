use crate::lexer::token::TokenKind;
use crate::lexer::Lexer;

fn kinds(source: &str) -> Vec<TokenKind> {
   let mut lexer = Lexer::new(source);
   let mut out = Vec::new();
   loop {
      let token = lexer.scan_token();
      let done = token.kind == TokenKind::Eof;
      out.push(token.kind);
      if done {
         break;
      }
   }
   out
}

#[test]
fn punctuation_and_operators() {
   let got = kinds("(){},.-+;/*!!====<<=>>=");
   assert_eq!(
      got,
      vec![
         TokenKind::LeftParen,
         TokenKind::RightParen,
         TokenKind::LeftBrace,
         TokenKind::RightBrace,
         TokenKind::Comma,
         TokenKind::Dot,
         TokenKind::Minus,
         TokenKind::Plus,
         TokenKind::Semicolon,
         TokenKind::Slash,
         TokenKind::Star,
         TokenKind::Bang,
         TokenKind::BangEqual,
         TokenKind::EqualEqual,
         TokenKind::Less,
         TokenKind::LessEqual,
         TokenKind::Greater,
         TokenKind::GreaterEqual,
         TokenKind::Eof,
      ]
   );
}

#[test]
fn keywords_are_not_identifiers() {
   let got = kinds("and class else false for fun if nil or print return super this true var while");
   assert_eq!(
      got,
      vec![
         TokenKind::And,
         TokenKind::Class,
         TokenKind::Else,
         TokenKind::False,
         TokenKind::For,
         TokenKind::Fun,
         TokenKind::If,
         TokenKind::Nil,
         TokenKind::Or,
         TokenKind::Print,
         TokenKind::Return,
         TokenKind::Super,
         TokenKind::This,
         TokenKind::True,
         TokenKind::Var,
         TokenKind::While,
         TokenKind::Eof,
      ]
   );
}

#[test]
fn identifier_with_keyword_prefix_is_still_an_identifier() {
   let mut lexer = Lexer::new("andy");
   let token = lexer.scan_token();
   assert_eq!(token.kind, TokenKind::Identifier);
   assert_eq!(token.lexeme, "andy");
}

#[test]
fn number_literals_with_and_without_fraction() {
   let mut lexer = Lexer::new("123 45.67");
   let first = lexer.scan_token();
   assert_eq!(first.kind, TokenKind::Number);
   assert_eq!(first.lexeme, "123");

   let second = lexer.scan_token();
   assert_eq!(second.kind, TokenKind::Number);
   assert_eq!(second.lexeme, "45.67");
}

#[test]
fn trailing_dot_is_not_part_of_the_number() {
   // No digit follows the '.', so it isn't consumed as a fraction.
   let mut lexer = Lexer::new("123.");
   let number = lexer.scan_token();
   assert_eq!(number.lexeme, "123");
   let dot = lexer.scan_token();
   assert_eq!(dot.kind, TokenKind::Dot);
}

#[test]
fn string_literal() {
   let mut lexer = Lexer::new("\"hello world\"");
   let token = lexer.scan_token();
   assert_eq!(token.kind, TokenKind::Str);
   assert_eq!(token.lexeme, "\"hello world\"");
}

#[test]
fn multiline_string_advances_the_line_counter() {
   let mut lexer = Lexer::new("\"a\nb\" 1");
   let string = lexer.scan_token();
   assert_eq!(string.kind, TokenKind::Str);
   let number = lexer.scan_token();
   assert_eq!(number.line, 2);
}

#[test]
fn unterminated_string_is_an_error_token() {
   let mut lexer = Lexer::new("\"never closed");
   let token = lexer.scan_token();
   assert_eq!(token.kind, TokenKind::Error);
   assert_eq!(token.lexeme, "Unterminated string.");
}

#[test]
fn line_comment_is_skipped() {
   let mut lexer = Lexer::new("1 // a comment\n2");
   let first = lexer.scan_token();
   assert_eq!(first.lexeme, "1");
   let second = lexer.scan_token();
   assert_eq!(second.lexeme, "2");
   assert_eq!(second.line, 2);
}

#[test]
fn unexpected_character_is_an_error_token() {
   let mut lexer = Lexer::new("@");
   let token = lexer.scan_token();
   assert_eq!(token.kind, TokenKind::Error);
   assert_eq!(token.lexeme, "Unexpected character.");
}

#[test]
fn eof_repeats_forever() {
   let mut lexer = Lexer::new("");
   assert_eq!(lexer.scan_token().kind, TokenKind::Eof);
   assert_eq!(lexer.scan_token().kind, TokenKind::Eof);
}
