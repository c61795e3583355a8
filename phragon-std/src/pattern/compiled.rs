//! Compiled patterns: matching and reverse generation.

use super::parser::{ParamToken, Token, tokenize};
use crate::modifiers::ModifierRegistry;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use phragon_core::{
    BuildError, DEFAULT_SEGMENT, MatchOutcome, Params, PatternError, Validator, Value,
};
use regex::Regex;
use std::{collections::HashSet, fmt};

/// Characters escaped in a URL component (everything `encodeURIComponent` escapes).
pub(crate) const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Literal characters that an optional parameter absorbs from the literal
/// directly before it, so `/a/{x?}` matches both `/a` and `/a/val`.
const SEPARATORS: [char; 2] = ['/', '.'];

/// The separator the literal at `index` hands to the optional parameter after
/// it. A template that is only a separator before its first parameter keeps
/// it, so `/{lang?}` still matches `/`.
fn absorbed_separator(tokens: &[Token], index: usize) -> Option<char> {
    let Some(Token::Literal(text)) = tokens.get(index) else {
        return None;
    };
    let Some(Token::Param(next)) = tokens.get(index + 1) else {
        return None;
    };
    let last = text.chars().last().filter(|c| SEPARATORS.contains(c))?;
    if !next.optional || (index == 0 && text.len() == last.len_utf8()) {
        return None;
    }
    Some(last)
}

/// A default value, as written and as coerced by the parameter's modifier.
struct ParamDefault {
    raw: String,
    value: Value,
}

struct CompiledParam {
    name: String,
    group: String,
    validator: Option<Box<dyn Validator>>,
    optional: bool,
    default: Option<ParamDefault>,
    /// Separator emitted (and matched) only together with the value.
    prefix: Option<char>,
}

enum Part {
    Literal(String),
    Param(usize),
}

/// A template compiled into an anchored regex plus a reverse generator.
///
/// Immutable once compiled; share it behind an `Arc`.
pub struct Pattern {
    template: String,
    tokens: Vec<Token>,
    regex: Regex,
    params: Vec<CompiledParam>,
    parts: Vec<Part>,
}

impl Pattern {
    /// Compile a template with the built-in modifiers.
    pub fn new(template: &str) -> Result<Self, PatternError> {
        Self::compile(template, &ModifierRegistry::new())
    }

    /// Compile a template, resolving modifiers in `modifiers`.
    ///
    /// Fails on malformed syntax, unknown modifiers, bad modifier arguments and
    /// duplicate parameter names.
    pub fn compile(template: &str, modifiers: &ModifierRegistry) -> Result<Self, PatternError> {
        let tokens = tokenize(template)?;

        let mut seen = HashSet::new();
        let mut source = String::from("^");
        let mut params = Vec::new();
        let mut parts = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => {
                    let mut text = text.as_str();
                    if let Some(separator) = absorbed_separator(&tokens, index) {
                        text = &text[..text.len() - separator.len_utf8()];
                    }
                    source.push_str(&regex::escape(text));
                    if !text.is_empty() {
                        parts.push(Part::Literal(text.to_string()));
                    }
                }
                Token::Param(param) => {
                    if !seen.insert(param.name.as_str()) {
                        return Err(PatternError::DuplicateParam(param.name.clone()));
                    }

                    let (fragment, validator) = match &param.modifier {
                        Some(call) => {
                            let modifier = modifiers.resolve(&call.name)?;
                            let validator = modifier.build(&call.args)?;
                            (modifier.fragment().to_string(), Some(validator))
                        }
                        None => (DEFAULT_SEGMENT.to_string(), None),
                    };

                    let prefix = index
                        .checked_sub(1)
                        .and_then(|i| absorbed_separator(&tokens, i));

                    let default = match &param.default {
                        Some(raw) => Some(coerce_default(param, raw, validator.as_deref())?),
                        None => None,
                    };

                    let group = format!("p{}", params.len());
                    if param.optional {
                        let prefix = prefix
                            .map(|c| regex::escape(&c.to_string()))
                            .unwrap_or_default();
                        source.push_str(&format!("(?:{prefix}(?P<{group}>{fragment}))?"));
                    } else {
                        source.push_str(&format!("(?P<{group}>{fragment})"));
                    }

                    parts.push(Part::Param(params.len()));
                    params.push(CompiledParam {
                        name: param.name.clone(),
                        group,
                        validator,
                        optional: param.optional,
                        default,
                        prefix,
                    });
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| PatternError::Regex(e.to_string()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(template, regex = %source, params = params.len(), "compiled pattern");

        Ok(Self {
            template: template.to_string(),
            tokens,
            regex,
            params,
            parts,
        })
    }

    /// The source template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The tokens, in source order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The anchored regex source.
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameter names, in source order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Match a path, returning the extracted parameters.
    ///
    /// `None` means no match: either the regex failed or a modifier rejected a
    /// segment. Absent optional parameters take their default, or are left out.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut result = Params::new();

        for param in &self.params {
            let Some(capture) = captures.name(&param.group) else {
                if let Some(default) = &param.default {
                    result.insert(param.name.as_str(), default.value.clone());
                }
                continue;
            };

            let Ok(raw) = percent_decode_str(capture.as_str()).decode_utf8() else {
                return None;
            };
            let value = match param.validator.as_ref().map(|v| v.validate(&raw)) {
                Some(MatchOutcome::Rejected) => return None,
                Some(MatchOutcome::AcceptedValue(value)) => value,
                Some(MatchOutcome::AcceptedRaw) | None => Value::Str(raw.into_owned()),
            };
            result.insert(param.name.as_str(), value);
        }

        Some(result)
    }

    /// Whether the path matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.matches(path).is_some()
    }

    /// Generate a path from parameter values.
    ///
    /// Present values are formatted by their modifier (or `Display`) and
    /// percent-encoded. Absent values fall back to the default, then to nothing
    /// for optional parameters; a missing required parameter is an error.
    pub fn to_path(&self, data: &Params) -> Result<String, BuildError> {
        let mut path = String::new();

        for part in &self.parts {
            let param = match part {
                Part::Literal(text) => {
                    path.push_str(text);
                    continue;
                }
                Part::Param(index) => &self.params[*index],
            };

            let segment = match data.get(&param.name) {
                Some(value) => {
                    let text = param
                        .validator
                        .as_ref()
                        .and_then(|v| v.format(value))
                        .unwrap_or_else(|| value.to_string());
                    utf8_percent_encode(&text, URI_COMPONENT).to_string()
                }
                None => match &param.default {
                    Some(default) => default.raw.clone(),
                    None if param.optional => continue,
                    None => return Err(BuildError::MissingParam(param.name.clone())),
                },
            };

            if let Some(prefix) = param.prefix {
                path.push(prefix);
            }
            path.push_str(&segment);
        }

        Ok(path)
    }
}

/// Run a default through the parameter's modifier, so an absent segment
/// yields the same value type as a present one.
fn coerce_default(
    param: &ParamToken,
    raw: &str,
    validator: Option<&dyn Validator>,
) -> Result<ParamDefault, PatternError> {
    let value = match validator.map(|v| v.validate(raw)) {
        Some(MatchOutcome::Rejected) => {
            return Err(PatternError::InvalidArgument {
                modifier: param
                    .modifier
                    .as_ref()
                    .map(|call| call.name.clone())
                    .unwrap_or_default(),
                message: format!("default `{raw}` of `{}` is rejected", param.name),
            });
        }
        Some(MatchOutcome::AcceptedValue(value)) => value,
        Some(MatchOutcome::AcceptedRaw) | None => Value::Str(raw.to_string()),
    };
    Ok(ParamDefault {
        raw: raw.to_string(),
        value,
    })
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("template", &self.template)
            .field("regex", &self.regex.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_pattern() {
        let pattern = Pattern::new("/about/team").unwrap();
        assert_eq!(pattern.matches("/about/team"), Some(Params::new()));
        assert_eq!(pattern.matches("/about/team/x"), None);
        assert_eq!(pattern.to_path(&Params::new()).unwrap(), "/about/team");
    }

    #[test]
    fn test_regex_metacharacters_in_literals() {
        let pattern = Pattern::new("/files/{name}.tar.gz").unwrap();
        assert_eq!(
            pattern.matches("/files/backup.tar.gz"),
            Some(Params::new().with("name", "backup"))
        );
        assert_eq!(pattern.matches("/files/backupXtarXgz"), None);
    }

    #[test]
    fn test_reg_modifier() {
        let pattern = Pattern::new("/user/{id:reg([0-9]+)}").unwrap();
        assert_eq!(
            pattern.matches("/user/42"),
            Some(Params::new().with("id", "42"))
        );
        assert_eq!(pattern.matches("/user/abc"), None);
    }

    #[test]
    fn test_reg_modifier_with_groups() {
        let pattern = Pattern::new("/user/{id:reg(([0-9]+))}").unwrap();
        assert_eq!(
            pattern.matches("/user/42").unwrap().get("id"),
            Some(&Value::Captures(vec![Some("42".into()), Some("42".into())]))
        );
    }

    #[test]
    fn test_optional_param() {
        let pattern = Pattern::new("/a/{x?}").unwrap();
        assert_eq!(pattern.matches("/a"), Some(Params::new()));
        assert_eq!(pattern.matches("/a/val"), Some(Params::new().with("x", "val")));
        assert_eq!(pattern.to_path(&Params::new()).unwrap(), "/a");
        assert_eq!(
            pattern.to_path(&Params::new().with("x", "val")).unwrap(),
            "/a/val"
        );
    }

    #[test]
    fn test_optional_param_with_default() {
        let pattern = Pattern::new("/list/{page:int?=1}").unwrap();
        assert_eq!(pattern.matches("/list"), Some(Params::new().with("page", 1)));
        assert_eq!(
            pattern.matches("/list/3"),
            Some(Params::new().with("page", 3))
        );
        assert_eq!(pattern.matches("/list"), pattern.matches("/list/1"));
        assert_eq!(pattern.to_path(&Params::new()).unwrap(), "/list/1");
    }

    #[test]
    fn test_default_rejected_by_modifier() {
        for template in ["/list/{page:int(1, 10)?=99}", "/list/{page:int?=abc}"] {
            assert!(
                matches!(
                    Pattern::new(template).unwrap_err(),
                    PatternError::InvalidArgument { ref modifier, .. } if modifier == "int"
                ),
                "{template}"
            );
        }
        assert!(Pattern::new("/list/{page:int(1, 10)?=10}").is_ok());
    }

    #[test]
    fn test_optional_param_after_leading_slash() {
        let pattern = Pattern::new("/{lang?}").unwrap();
        assert_eq!(pattern.regex_source(), "^/(?:(?P<p0>[^/]+))?$");
        assert_eq!(pattern.matches("/"), Some(Params::new()));
        assert_eq!(pattern.matches("/en"), Some(Params::new().with("lang", "en")));
        assert_eq!(pattern.matches(""), None);

        let root = pattern.to_path(&Params::new()).unwrap();
        assert_eq!(root, "/");
        assert_eq!(pattern.matches(&root), Some(Params::new()));
        assert_eq!(
            pattern.to_path(&Params::new().with("lang", "en")).unwrap(),
            "/en"
        );
    }

    #[test]
    fn test_malformed_percent_escape_is_no_match() {
        let pattern = Pattern::new("/tag/{name}").unwrap();
        assert_eq!(pattern.matches("/tag/%FF"), None);
        assert_eq!(pattern.matches("/tag/%FE"), None);
        assert_eq!(
            pattern.matches("/tag/caf%C3%A9"),
            Some(Params::new().with("name", "café"))
        );
    }

    #[test]
    fn test_missing_required_param() {
        let pattern = Pattern::new("/user/{id}").unwrap();
        assert_eq!(
            pattern.to_path(&Params::new()),
            Err(BuildError::MissingParam("id".into()))
        );
    }

    #[test]
    fn test_percent_encoding_round_trip() {
        let pattern = Pattern::new("/tag/{name}").unwrap();
        let data = Params::new().with("name", "rock & roll/2");
        let path = pattern.to_path(&data).unwrap();
        assert_eq!(path, "/tag/rock%20%26%20roll%2F2");
        assert_eq!(pattern.matches(&path), Some(data));
    }

    #[test]
    fn test_modifier_rejection_is_no_match() {
        let pattern = Pattern::new("/day/{d:date(Y-m-d)}").unwrap();
        assert!(pattern.is_match("/day/2021-02-28"));
        assert!(!pattern.is_match("/day/2021-02-30"));
        assert!(!pattern.is_match("/day/2021-13-01"));
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(
            Pattern::new("/{a}/{a}").unwrap_err(),
            PatternError::DuplicateParam("a".into())
        );
        assert_eq!(
            Pattern::new("/{a:slug}").unwrap_err(),
            PatternError::UnknownModifier("slug".into())
        );
        assert!(matches!(
            Pattern::new("/{a:reg}").unwrap_err(),
            PatternError::ModifierArity { .. }
        ));
    }

    #[test]
    fn test_param_names_in_order() {
        let pattern = Pattern::new("/{year}/{month}/{slug?}").unwrap();
        let names: Vec<_> = pattern.param_names().collect();
        assert_eq!(names, vec!["year", "month", "slug"]);
        assert_eq!(
            pattern.regex_source(),
            "^/(?P<p0>[^/]+)/(?P<p1>[^/]+)(?:/(?P<p2>[^/]+))?$"
        );
    }
}
