//! Genome contract consumed by the result model, plus a network genome
//! implementation with a line-oriented plain-text encoding.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// A serializable candidate encoding.
///
/// The result model never interprets a genome. It only needs a stable
/// identity, a deterministic text form it can store verbatim, and the sizes
/// of the phenotype built from it.
pub trait Genome: Clone {
    /// Stable identity of this genome.
    fn id(&self) -> u64;

    /// Write the plain-text form. Must be deterministic for an unchanged genome.
    fn write_plain<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()>;

    /// Parse the plain-text form written by [`Genome::write_plain`].
    fn read_plain<R: BufRead>(r: R, id: u64) -> io::Result<Self>;

    /// Number of nodes in the phenotype.
    fn node_count(&self) -> usize;

    /// Number of links in the phenotype.
    fn link_count(&self) -> usize;
}

/// Role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
    Bias,
}

/// Node activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Sigmoid,
    Relu,
    Tanh,
    Linear,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($ty::$variant => $text),+
                })
            }
        }

        impl FromStr for $ty {
            type Err = io::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(invalid(format!(
                        concat!("unknown ", stringify!($ty), ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum!(NodeKind {
    Input => "input",
    Hidden => "hidden",
    Output => "output",
    Bias => "bias",
});

text_enum!(Activation {
    Sigmoid => "sigmoid",
    Relu => "relu",
    Tanh => "tanh",
    Linear => "linear",
});

/// A node gene.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGene {
    pub id: u32,
    pub kind: NodeKind,
    pub activation: Activation,
}

/// A connection gene between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkGene {
    pub input: u32,
    pub output: u32,
    pub weight: f64,
    pub enabled: bool,
}

/// Direct encoding of a neural network: node genes plus link genes.
///
/// Plain-text form:
///
/// ```text
/// genomestart 7
/// node 1 input linear
/// node 2 output sigmoid
/// link 1 2 0.5 1
/// genomeend 7
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkGenome {
    pub id: u64,
    pub nodes: Vec<NodeGene>,
    pub links: Vec<LinkGene>,
}

impl NetworkGenome {
    /// Create an empty genome.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Create a genome with every input linked to every output.
    pub fn fully_connected(id: u64, inputs: u32, outputs: u32) -> Self {
        let mut genome = Self::new(id);
        for i in 1..=inputs {
            genome.push_node(i, NodeKind::Input, Activation::Linear);
        }
        for o in 1..=outputs {
            genome.push_node(inputs + o, NodeKind::Output, Activation::Sigmoid);
        }
        for i in 1..=inputs {
            for o in 1..=outputs {
                genome.push_link(i, inputs + o, 1.0, true);
            }
        }
        genome
    }

    pub fn push_node(&mut self, id: u32, kind: NodeKind, activation: Activation) -> &mut Self {
        self.nodes.push(NodeGene {
            id,
            kind,
            activation,
        });
        self
    }

    pub fn push_link(&mut self, input: u32, output: u32, weight: f64, enabled: bool) -> &mut Self {
        self.links.push(LinkGene {
            input,
            output,
            weight,
            enabled,
        });
        self
    }

    fn has_node(&self, id: u32) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

impl Genome for NetworkGenome {
    fn id(&self) -> u64 {
        self.id
    }

    fn write_plain<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "genomestart {}", self.id)?;
        for node in &self.nodes {
            writeln!(w, "node {} {} {}", node.id, node.kind, node.activation)?;
        }
        for link in &self.links {
            writeln!(
                w,
                "link {} {} {} {}",
                link.input, link.output, link.weight, link.enabled as u8
            )?;
        }
        writeln!(w, "genomeend {}", self.id)
    }

    fn read_plain<R: BufRead>(r: R, id: u64) -> io::Result<Self> {
        let mut genome = Self::new(id);
        let mut started = false;
        let mut ended = false;

        for line in r.lines() {
            let line = line?;
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            if ended {
                return Err(invalid(format!("data after genomeend: {}", line)));
            }

            match keyword {
                "genomestart" => {
                    if started {
                        return Err(invalid("repeated genomestart".to_string()));
                    }
                    let parsed: u64 = parse_token(tokens.next(), "genome id")?;
                    if parsed != id {
                        return Err(invalid(format!(
                            "genome id mismatch: expected {}, found {}",
                            id, parsed
                        )));
                    }
                    started = true;
                }
                _ if !started => {
                    return Err(invalid(format!("expected genomestart, found {}", keyword)));
                }
                "node" => {
                    let node_id = parse_token(tokens.next(), "node id")?;
                    let kind = parse_token(tokens.next(), "node kind")?;
                    let activation = parse_token(tokens.next(), "activation")?;
                    if genome.has_node(node_id) {
                        return Err(invalid(format!("duplicate node {}", node_id)));
                    }
                    genome.push_node(node_id, kind, activation);
                }
                "link" => {
                    let input = parse_token(tokens.next(), "link input")?;
                    let output = parse_token(tokens.next(), "link output")?;
                    let weight = parse_token(tokens.next(), "link weight")?;
                    let enabled = match tokens.next() {
                        Some("1") => true,
                        Some("0") => false,
                        other => {
                            return Err(invalid(format!("bad link enabled flag: {:?}", other)));
                        }
                    };
                    if !genome.has_node(input) || !genome.has_node(output) {
                        return Err(invalid(format!(
                            "link {} -> {} references unknown node",
                            input, output
                        )));
                    }
                    genome.push_link(input, output, weight, enabled);
                }
                "genomeend" => {
                    let parsed: u64 = parse_token(tokens.next(), "genome id")?;
                    if parsed != id {
                        return Err(invalid(format!("genomeend id {} != {}", parsed, id)));
                    }
                    ended = true;
                }
                other => return Err(invalid(format!("unknown record: {}", other))),
            }

            if let Some(extra) = tokens.next() {
                return Err(invalid(format!("trailing token {:?} in {:?}", extra, line)));
            }
        }

        if !ended {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "genome text ended before genomeend",
            ));
        }
        Ok(genome)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn link_count(&self) -> usize {
        self.links.iter().filter(|l| l.enabled).count()
    }
}

fn parse_token<T: FromStr>(token: Option<&str>, what: &str) -> io::Result<T> {
    let token = token.ok_or_else(|| invalid(format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| invalid(format!("invalid {}: {}", what, token)))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
