//! A [`ResultSink`] that writes CSV rows to a file or stdout as each step
//! lands, rather than buffering the whole run in memory the way
//! `InMemorySink` does — the streaming alternative the result-sink
//! interface (§6) is deliberately pluggable to support.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use spicier_core::linalg::Vector;
use spicier_core::netlist::Netlist;
use spicier_solver::sink::ResultSink;

pub struct WriterSink {
    out: Box<dyn Write>,
    header_written: bool,
    last: HashMap<String, f64>,
}

impl WriterSink {
    pub fn new(path: Option<&Path>) -> anyhow::Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(p) => Box::new(BufWriter::new(File::create(p)?)),
            None => Box::new(io::stdout()),
        };
        Ok(Self { out, header_written: false, last: HashMap::new() })
    }

    /// The most recently recorded value for a node/branch label, if any
    /// step has reported it.
    pub fn last_value(&self, label: &str) -> Option<f64> {
        self.last.get(label).copied()
    }

    /// Print a one-shot DC operating-point table (not a streaming run, so it
    /// bypasses `on_step`).
    pub fn write_dc(&mut self, netlist: &Netlist, x: &Vector) -> anyhow::Result<()> {
        writeln!(self.out, "node,voltage")?;
        for (i, label) in netlist.sorted_labels().iter().enumerate() {
            let v = x.get(i);
            self.last.insert(label.clone(), v);
            writeln!(self.out, "{label},{v:.6e}")?;
        }
        Ok(())
    }
}

impl ResultSink for WriterSink {
    fn on_step(&mut self, t: f64, node_voltages: &[(String, f64)], branch_currents: &[(String, f64)]) {
        if !self.header_written {
            write!(self.out, "t").ok();
            for (name, _) in node_voltages {
                write!(self.out, ",V({name})").ok();
            }
            for (name, _) in branch_currents {
                write!(self.out, ",I({name})").ok();
            }
            writeln!(self.out).ok();
            self.header_written = true;
        }

        write!(self.out, "{t:.9e}").ok();
        for (name, v) in node_voltages {
            write!(self.out, ",{v:.6e}").ok();
            self.last.insert(name.clone(), *v);
        }
        for (name, i) in branch_currents {
            write!(self.out, ",{i:.6e}").ok();
            self.last.insert(name.clone(), *i);
        }
        writeln!(self.out).ok();
    }
}
