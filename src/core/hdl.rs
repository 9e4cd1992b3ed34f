//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Structural design model exchanged with the elaborator and the netlister.
//!
//! Only the parts the platform touches are modelled: signals, clock domains,
//! the statements driving domain clocks and resets, reset synchronizers and the
//! submodule hierarchy.

use crate::core::platform::Session;
use crate::error::Error;
use crate::util::anyerror::Fault;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a signal, unique within the process.
pub type SignalId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signal {
    id: SignalId,
    name: String,
}

impl Signal {
    /// Creates a new signal with a fresh identity.
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockDomain {
    name: String,
    clk: Signal,
    rst: Option<Signal>,
    async_reset: bool,
}

impl ClockDomain {
    /// Creates a domain with its own `clk` and `rst` signals.
    pub fn new(name: &str) -> Self {
        let prefix = match name {
            "sync" => String::new(),
            _ => format!("{}_", name),
        };
        Self {
            name: name.to_string(),
            clk: Signal::new(&format!("{}clk", prefix)),
            rst: Some(Signal::new(&format!("{}rst", prefix))),
            async_reset: false,
        }
    }

    /// Removes the reset signal from the domain.
    pub fn reset_less(mut self) -> Self {
        self.rst = None;
        self
    }

    pub fn async_reset(mut self, enable: bool) -> Self {
        self.async_reset = enable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clk(&self) -> &Signal {
        &self.clk
    }

    pub fn rst(&self) -> Option<&Signal> {
        self.rst.as_ref()
    }

    pub fn is_async_reset(&self) -> bool {
        self.async_reset
    }
}

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Signal(Signal),
    /// The clock signal of the named domain.
    ClockSignal(String),
    /// The reset signal of the named domain.
    ResetSignal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    /// `None` for combinational logic, otherwise the clocking domain.
    domain: Option<String>,
    target: Target,
    value: Signal,
}

impl Assign {
    pub fn comb(target: Target, value: Signal) -> Self {
        Self {
            domain: None,
            target,
            value,
        }
    }

    pub fn sync(domain: &str, target: Target, value: Signal) -> Self {
        Self {
            domain: Some(domain.to_string()),
            target,
            value,
        }
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn value(&self) -> &Signal {
        &self.value
    }
}

/// Bridges an asynchronous reset input into a clock domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetSynchronizer {
    arst: Signal,
    domain: String,
    stages: usize,
}

impl ResetSynchronizer {
    pub fn new(arst: Signal, domain: &str) -> Self {
        Self {
            arst,
            domain: domain.to_string(),
            stages: 2,
        }
    }

    pub fn stages(mut self, stages: usize) -> Self {
        self.stages = stages;
        self
    }

    pub fn arst(&self) -> &Signal {
        &self.arst
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn get_stages(&self) -> usize {
        self.stages
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submodule {
    Fragment(Fragment),
    ResetSynchronizer(ResetSynchronizer),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    domains: Vec<ClockDomain>,
    statements: Vec<Assign>,
    uses: BTreeSet<String>,
    submodules: Vec<(String, Submodule)>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_domain(&mut self, domain: ClockDomain) {
        self.domains.push(domain);
    }

    /// Adds a statement; synchronous statements mark their domain as used.
    pub fn add_statement(&mut self, stmt: Assign) {
        if let Some(d) = stmt.domain() {
            self.uses.insert(d.to_string());
        }
        self.statements.push(stmt);
    }

    /// Marks `domain` as clocking logic within this fragment.
    pub fn use_domain(&mut self, domain: &str) {
        self.uses.insert(domain.to_string());
    }

    pub fn add_submodule(&mut self, name: &str, module: Submodule) {
        self.submodules.push((name.to_string(), module));
    }

    pub fn domains(&self) -> &Vec<ClockDomain> {
        &self.domains
    }

    pub fn statements(&self) -> &Vec<Assign> {
        &self.statements
    }

    pub fn submodules(&self) -> &Vec<(String, Submodule)> {
        &self.submodules
    }

    /// Checks if `domain` is defined anywhere in the hierarchy.
    pub fn defines_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d.name() == domain)
            || self.submodules.iter().any(|(_, m)| match m {
                Submodule::Fragment(f) => f.defines_domain(domain),
                Submodule::ResetSynchronizer(_) => false,
            })
    }

    /// Collects every domain used anywhere in the hierarchy.
    pub fn used_domains(&self) -> BTreeSet<String> {
        let mut uses = self.uses.clone();
        for (_, m) in &self.submodules {
            match m {
                Submodule::Fragment(f) => uses.extend(f.used_domains()),
                Submodule::ResetSynchronizer(rs) => {
                    uses.insert(rs.domain().to_string());
                }
            }
        }
        uses
    }

    /// Lists the domains that are used but never defined, in name order.
    pub fn missing_domains(&self) -> Vec<String> {
        self.used_domains()
            .into_iter()
            .filter(|d| self.defines_domain(d) == false)
            .collect()
    }

    /// Finalizes the fragment for netlist conversion.
    ///
    /// Every domain used in the hierarchy must be defined by now.
    pub fn prepare(self) -> Result<Self, Error> {
        match self.missing_domains().into_iter().next() {
            Some(d) => Err(Error::DomainNotDefined(d)),
            None => Ok(self),
        }
    }
}

/// A design that can be turned into a [Fragment] for a given platform session.
pub trait Elaboratable {
    fn elaborate(&self, platform: &mut Session<'_>) -> Result<Fragment, Fault>;
}

impl Elaboratable for Fragment {
    fn elaborate(&self, _: &mut Session<'_>) -> Result<Fragment, Fault> {
        Ok(self.clone())
    }
}
