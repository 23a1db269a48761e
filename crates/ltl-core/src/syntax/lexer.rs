//! LTL formula lexer using logos
//!
//! Every operator accepts both its Unicode glyph and the usual ASCII
//! spellings (`!`/`~`, `X`, `G`/`[]`, `F`/`<>`, `&`/`&&`/`/\`,
//! `|`/`||`/`\/`, `->`, `<->`). The single letters `U`, `X`, `G` and `F`
//! lex as operators, so they are not usable as atom names; longer
//! identifiers starting with them are.

use logos::Logos;

/// LTL tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Constants ===
    #[token("true")]
    #[token("TRUE")]
    #[token("⊤")]
    True,

    #[token("false")]
    #[token("FALSE")]
    #[token("⊥")]
    False,

    // === Unary operators ===
    #[token("!")]
    #[token("~")]
    #[token("¬")]
    Not,

    #[token("X", priority = 10)]
    #[token("○")]
    Next,

    #[token("G", priority = 10)]
    #[token("[]")]
    #[token("□")]
    Always,

    #[token("F", priority = 10)]
    #[token("<>")]
    #[token("◇")]
    Eventually,

    // === Binary operators ===
    #[token("&&")]
    #[token("&")]
    #[token(r"/\")]
    #[token("∧")]
    And,

    #[token("||")]
    #[token("|")]
    #[token(r"\/")]
    #[token("∨")]
    Or,

    #[token("U", priority = 10)]
    Until,

    #[token("->")]
    #[token("→")]
    Implies,

    #[token("<->")]
    #[token("↔")]
    Iff,

    // === Delimiters ===
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl Token {
    /// Human-readable token description for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Token::True => "`true`",
            Token::False => "`false`",
            Token::Not => "`¬`",
            Token::Next => "`○`",
            Token::Always => "`□`",
            Token::Eventually => "`◇`",
            Token::And => "`∧`",
            Token::Or => "`∨`",
            Token::Until => "`U`",
            Token::Implies => "`→`",
            Token::Iff => "`↔`",
            Token::LParen => "`(`",
            Token::RParen => "`)`",
            Token::Ident => "identifier",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.expect("lex error")).collect()
    }

    #[test]
    fn lexes_unicode_and_ascii_aliases() {
        assert_eq!(
            lex("□ ◇ ○ ¬ ∧ ∨ → ↔"),
            lex(r"[] <> X ! && || -> <->")
        );
        assert_eq!(lex(r"G F X ~ & | /\ \/"), {
            let mut v = lex("□ ◇ ○ ¬ ∧ ∨");
            v.push(Token::And);
            v.push(Token::Or);
            v
        });
    }

    #[test]
    fn single_letter_operators_vs_identifiers() {
        assert_eq!(lex("U"), vec![Token::Until]);
        assert_eq!(lex("G"), vec![Token::Always]);
        // Longer identifiers win by longest match
        assert_eq!(lex("Up"), vec![Token::Ident]);
        assert_eq!(lex("Gp Goal"), vec![Token::Ident, Token::Ident]);
    }

    #[test]
    fn iff_beats_eventually_angle_form() {
        assert_eq!(lex("p <-> q"), vec![Token::Ident, Token::Iff, Token::Ident]);
        assert_eq!(lex("<> q"), vec![Token::Eventually, Token::Ident]);
    }

    #[test]
    fn rejects_stray_characters() {
        let mut lexer = Token::lexer("p # q");
        assert_eq!(lexer.next(), Some(Ok(Token::Ident)));
        assert_eq!(lexer.next(), Some(Err(())));
    }
}
