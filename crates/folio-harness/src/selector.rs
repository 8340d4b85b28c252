#![forbid(unsafe_code)]

//! The CSS selector subset understood by [`FakePage`](crate::FakePage).
//!
//! Supported: `*`, `tag`, `#id`, `.class`, `[attr]`, `[attr="v"]`,
//! `[attr^="v"]`, compounds of those (`a.nav-link[href]`), and comma lists.
//! Combinators are rejected.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrTest {
    Present,
    Equals(String),
    StartsWith(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub test: AttrTest,
}

/// One compound selector: every part must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

/// A comma-separated list; any member may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<Compound>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub selector: String,
    pub reason: &'static str,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported selector `{}`: {}", self.selector, self.reason)
    }
}

impl std::error::Error for SelectorError {}

/// Read-only view of an element used for matching.
pub trait Matchable {
    fn tag(&self) -> &str;
    fn has_class(&self, class: &str) -> bool;
    fn attr(&self, name: &str) -> Option<&str>;
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(rest: &str) -> (&str, &str) {
    let end = rest.find(|c: char| !is_ident(c)).unwrap_or(rest.len());
    rest.split_at(end)
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let err = |reason| SelectorError {
            selector: selector.to_owned(),
            reason,
        };
        let mut list = Vec::new();
        for part in selector.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(err("empty compound"));
            }
            list.push(parse_compound(part).map_err(err)?);
        }
        Ok(Self(list))
    }

    pub fn matches(&self, el: &impl Matchable) -> bool {
        self.0.iter().any(|compound| compound.matches(el))
    }
}

fn parse_compound(mut rest: &str) -> Result<Compound, &'static str> {
    let mut compound = Compound::default();
    if let Some(stripped) = rest.strip_prefix('*') {
        rest = stripped;
    } else {
        let (tag, tail) = take_ident(rest);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = tail;
    }
    while let Some(c) = rest.chars().next() {
        match c {
            '#' | '.' => {
                let (name, tail) = take_ident(&rest[1..]);
                if name.is_empty() {
                    return Err("missing name after `#` or `.`");
                }
                if c == '#' {
                    compound.id = Some(name.to_owned());
                } else {
                    compound.classes.push(name.to_owned());
                }
                rest = tail;
            }
            '[' => {
                let close = rest.find(']').ok_or("unterminated attribute selector")?;
                compound.attrs.push(parse_attr(&rest[1..close])?);
                rest = &rest[close + 1..];
            }
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                return Err("combinators are not supported");
            }
            _ => return Err("unexpected character"),
        }
    }
    Ok(compound)
}

fn parse_attr(body: &str) -> Result<AttrSelector, &'static str> {
    let unquote = |v: &str| {
        let v = v.trim();
        v.strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(v)
            .to_owned()
    };
    let (name, test) = if let Some((name, value)) = body.split_once("^=") {
        (name, AttrTest::StartsWith(unquote(value)))
    } else if let Some((name, value)) = body.split_once('=') {
        (name, AttrTest::Equals(unquote(value)))
    } else {
        (body, AttrTest::Present)
    };
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident) {
        return Err("bad attribute name");
    }
    Ok(AttrSelector {
        name: name.to_owned(),
        test,
    })
}

impl Compound {
    pub fn matches(&self, el: &impl Matchable) -> bool {
        if let Some(tag) = &self.tag
            && el.tag() != tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attr("id") != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|class| el.has_class(class))
            && self.attrs.iter().all(|attr| {
                let value = el.attr(&attr.name);
                match &attr.test {
                    AttrTest::Present => value.is_some(),
                    AttrTest::Equals(expected) => value == Some(expected.as_str()),
                    AttrTest::StartsWith(prefix) => {
                        value.is_some_and(|v| v.starts_with(prefix.as_str()))
                    }
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct El {
        tag: &'static str,
        classes: &'static [&'static str],
        attrs: &'static [(&'static str, &'static str)],
    }

    impl Matchable for El {
        fn tag(&self) -> &str {
            self.tag
        }
        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }
        fn attr(&self, name: &str) -> Option<&str> {
            self.attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        }
    }

    #[test]
    fn parses_compound_lists() {
        let list = SelectorList::parse(".project-card, a.nav-link[href^=\"#\"]").unwrap();
        assert_eq!(list.0.len(), 2);
        assert_eq!(list.0[0].classes, vec!["project-card".to_owned()]);
        assert_eq!(list.0[1].tag.as_deref(), Some("a"));
        assert_eq!(
            list.0[1].attrs,
            vec![AttrSelector {
                name: "href".into(),
                test: AttrTest::StartsWith("#".into()),
            }]
        );
    }

    #[test]
    fn rejects_combinators() {
        assert!(SelectorList::parse(".project-links a").is_err());
        assert!(SelectorList::parse("ul > li").is_err());
    }

    #[test]
    fn matches_attributes() {
        let img = El {
            tag: "img",
            classes: &[],
            attrs: &[("loading", "lazy")],
        };
        assert!(SelectorList::parse("img[loading=\"lazy\"]").unwrap().matches(&img));
        assert!(!SelectorList::parse("img[loading=\"eager\"]").unwrap().matches(&img));
        assert!(SelectorList::parse("[loading]").unwrap().matches(&img));
        assert!(!SelectorList::parse("img[decoding]").unwrap().matches(&img));
    }

    #[test]
    fn matches_id_and_class() {
        let btn = El {
            tag: "button",
            classes: &["btn-submit", "primary"],
            attrs: &[("id", "send")],
        };
        assert!(SelectorList::parse("#send").unwrap().matches(&btn));
        assert!(SelectorList::parse("button.btn-submit.primary").unwrap().matches(&btn));
        assert!(!SelectorList::parse("a, .secondary").unwrap().matches(&btn));
    }
}
