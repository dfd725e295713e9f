use nom::{anychar, digit, IResult};
use std::fmt::Debug;
use std::str::{from_utf8, FromStr};

/// Parses a token of the hypergraph text format.
/// A *token* can be of one of the following two forms:
///
/// * It is a string containing neither of the symbols `'"'`, `' '`, `'('`, `')'`, `'['`, `']'`, `','`, `'#'`, `'%'`.
/// * It is delimited by the symbol `'"'` on both sides and each occurrence of `'\\'` or `'"'` inside the delimiters is escaped.
pub fn parse_token<A>(input: &[u8]) -> IResult<&[u8], A>
where
    A: FromStr,
    A::Err: Debug,
{
    named!(
        parse_token_s<&str>,
        map_res!(
            alt!(
                delimited!(
                    char!('\"'),
                    escaped!(is_not!("\\\""), '\\', anychar),
                    char!('\"')
                ) | is_not!(" \"()[],#%")
            ),
            from_utf8
        )
    );

    parse_token_s(input).map(|x| x.parse().unwrap())
}

/// Parses an unsigned decimal number.
pub fn parse_usize(input: &[u8]) -> IResult<&[u8], usize> {
    map!(input, map_res!(digit, from_utf8), |s: &str| s
        .parse()
        .unwrap())
}
