// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

/// Domain of a `<key>` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyDomain {
    Node,
    Edge,
    Other,
}

/// Single top-level record of a GraphML document.
///
/// `data` maps key ids (not attribute names) to raw text values;
/// key ids are resolved by the [GraphBuilder](super::graph_builder::GraphBuilder).
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Element {
    Key {
        id: String,
        domain: KeyDomain,
        name: String,
    },
    Graph {
        directed: bool,
    },
    Node {
        id: String,
        data: HashMap<String, String>,
    },
    Edge {
        source: String,
        target: String,
        directed: Option<bool>,
        data: HashMap<String, String>,
    },
}

impl Element {
    fn data_mut(&mut self) -> Option<&mut HashMap<String, String>> {
        match self {
            Element::Node { data, .. } | Element::Edge { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader streams [Elements](Element) from a GraphML document.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<Element, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut current: Option<Element> = None;
        let mut data_key: Option<String> = None;
        let mut text = String::new();

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"key" => return Some(parse_key(&start)),
                    b"graph" => return Some(parse_graph(&start)),
                    b"node" => return Some(parse_node(&start)),
                    b"edge" => return Some(parse_edge(&start)),
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    // <key> may only contain a <default>, which is not used
                    b"key" => return Some(parse_key(&start)),
                    b"graph" => return Some(parse_graph(&start)),
                    b"node" => match parse_node(&start) {
                        Ok(e) => current = Some(e),
                        Err(e) => return Some(Err(e)),
                    },
                    b"edge" => match parse_edge(&start) {
                        Ok(e) => current = Some(e),
                        Err(e) => return Some(Err(e)),
                    },
                    b"data" if current.is_some() => {
                        match get_attribute(&start, b"key") {
                            Ok(key) => data_key = key,
                            Err(e) => return Some(Err(e)),
                        }
                        text.clear();
                    }
                    _ => {}
                },

                Event::Text(t) => {
                    if data_key.is_some() {
                        match t.unescape() {
                            Ok(s) => text.push_str(&s),
                            Err(e) => return Some(Err(e)),
                        }
                    }
                }

                Event::CData(t) => {
                    if data_key.is_some() {
                        text.push_str(&String::from_utf8_lossy(&t));
                    }
                }

                Event::End(end) => match end.local_name().as_ref() {
                    b"data" => {
                        if let (Some(key), Some(data)) =
                            (data_key.take(), current.as_mut().and_then(Element::data_mut))
                        {
                            data.insert(key, text.trim().to_string());
                        }
                    }
                    b"node" | b"edge" => {
                        if let Some(e) = current.take() {
                            return Some(Ok(e));
                        }
                    }
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        current.map(Ok)
    }
}

fn get_attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "1" => Some(true),
        "false" | "False" | "0" => Some(false),
        _ => None,
    }
}

fn parse_key(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let mut id = String::new();
    let mut name = String::new();
    let mut domain = KeyDomain::Other;

    for attr in start.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"id" => id = attr.unescape_value()?.into_owned(),
            b"attr.name" => name = attr.unescape_value()?.into_owned(),
            b"for" => {
                domain = match attr.value.as_ref() {
                    b"node" => KeyDomain::Node,
                    b"edge" => KeyDomain::Edge,
                    _ => KeyDomain::Other,
                }
            }
            _ => {}
        }
    }

    // Keys without an explicit attribute name are referred to by their id
    if name.is_empty() {
        name = id.clone();
    }

    Ok(Element::Key { id, domain, name })
}

fn parse_graph(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let directed = match get_attribute(start, b"edgedefault")? {
        Some(s) => s != "undirected",
        None => true,
    };
    Ok(Element::Graph { directed })
}

fn parse_node(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    Ok(Element::Node {
        id: get_attribute(start, b"id")?.unwrap_or_default(),
        data: HashMap::default(),
    })
}

fn parse_edge(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let mut source = String::new();
    let mut target = String::new();
    let mut directed = None;

    for attr in start.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"source" => source = from_utf8(&attr.value).unwrap_or_default().to_string(),
            b"target" => target = from_utf8(&attr.value).unwrap_or_default().to_string(),
            b"directed" => directed = parse_bool(from_utf8(&attr.value).unwrap_or_default()),
            _ => {}
        }
    }

    Ok(Element::Edge {
        source,
        target,
        directed,
        data: HashMap::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! data {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    const DOCUMENT: &[u8] = br#"<?xml version='1.0' encoding='utf-8'?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="y" attr.type="double" />
  <key id="d1" for="edge" attr.name="highway" attr.type="string">
    <default>road</default>
  </key>
  <key id="d2" for="graph" />
  <graph edgedefault="undirected">
    <data key="d2">ignored</data>
    <node id="1">
      <data key="d0">-6.2</data>
    </node>
    <node id="2" />
    <edge source="1" target="2" directed="true">
      <data key="d1">[&apos;primary&apos;, &apos;secondary&apos;]</data>
    </edge>
    <edge source="2" target="1"><data key="d1"><![CDATA[a & b]]></data></edge>
  </graph>
</graphml>
"#;

    fn expected() -> Vec<Element> {
        vec![
            Element::Key {
                id: "d0".to_string(),
                domain: KeyDomain::Node,
                name: "y".to_string(),
            },
            Element::Key {
                id: "d1".to_string(),
                domain: KeyDomain::Edge,
                name: "highway".to_string(),
            },
            Element::Key {
                id: "d2".to_string(),
                domain: KeyDomain::Other,
                name: "d2".to_string(),
            },
            Element::Graph { directed: false },
            Element::Node {
                id: "1".to_string(),
                data: data! {"d0": "-6.2"},
            },
            Element::Node {
                id: "2".to_string(),
                data: data! {},
            },
            Element::Edge {
                source: "1".to_string(),
                target: "2".to_string(),
                directed: Some(true),
                data: data! {"d1": "['primary', 'secondary']"},
            },
            Element::Edge {
                source: "2".to_string(),
                target: "1".to_string(),
                directed: None,
                data: data! {"d1": "a & b"},
            },
        ]
    }

    #[test]
    fn parse_from_buf() -> Result<(), quick_xml::Error> {
        let elements = Reader::from_buffer(DOCUMENT).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(elements, expected());
        Ok(())
    }

    #[test]
    fn parse_from_io() -> Result<(), quick_xml::Error> {
        let elements =
            Reader::from_io(io::Cursor::new(DOCUMENT)).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(elements, expected());
        Ok(())
    }

    #[test]
    fn malformed_document() {
        let result = Reader::from_buffer(b"<graphml><graph><node id=\"1\"></edge></graph>")
            .collect::<Result<Vec<_>, _>>();
        assert!(result.is_err());
    }
}
