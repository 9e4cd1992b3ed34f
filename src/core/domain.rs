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

//! Creation of the default clock domain for designs that use "sync" without
//! defining it.

use crate::core::hdl::{Assign, ClockDomain, Fragment, ResetSynchronizer, Signal, Submodule, Target};
use crate::core::platform::Session;
use crate::error::Error;

pub const DEFAULT_DOMAIN: &str = "sync";

/// Name given to the reset created when the platform declares none.
pub const DEFAULT_RESET: &str = "rst";

/// Requests the resource `name` and returns its input signal.
fn request_input(session: &mut Session<'_>, name: &str) -> Result<Signal, Error> {
    let pin = session.request(name, 0)?;
    match pin.i() {
        Some(i) => Ok(i.clone()),
        None => Err(Error::PinHasNoInput(name.to_string(), 0)),
    }
}

/// Builds the logic defining `domain` from the platform's default clock and
/// reset, adding the new top-level signals to `ports`.
///
/// Returns `None` when the platform cannot provide the domain.
pub fn create_missing_domain(
    session: &mut Session<'_>,
    ports: &mut Vec<Signal>,
    domain: &str,
) -> Result<Option<Fragment>, Error> {
    let default_clk = match session.platform().get_default_clk() {
        Some(clk) if domain == DEFAULT_DOMAIN => clk,
        _ => return Ok(None),
    };

    let clk_i = request_input(session, default_clk)?;
    ports.push(clk_i.clone());

    let rst_i = match session.default_rst().map(|s| s.to_string()) {
        Some(rst) => request_input(session, &rst)?,
        None => {
            if ports.iter().any(|p| p.name() == DEFAULT_RESET) {
                return Err(Error::ResetNameTaken(DEFAULT_RESET.to_string()));
            }
            session.set_default_rst(DEFAULT_RESET);
            Signal::new(DEFAULT_RESET)
        }
    };
    ports.push(rst_i.clone());

    tracing::debug!(
        "creating domain {:?} clocked by {:?} and reset by {:?}",
        domain,
        clk_i.name(),
        rst_i.name()
    );

    let mut m = Fragment::new();
    m.add_domain(ClockDomain::new(DEFAULT_DOMAIN));
    m.add_statement(Assign::comb(Target::ClockSignal(DEFAULT_DOMAIN.to_string()), clk_i));
    m.add_submodule(
        "reset_sync",
        Submodule::ResetSynchronizer(ResetSynchronizer::new(rst_i, DEFAULT_DOMAIN)),
    );
    Ok(Some(m))
}

/// Adds the default domain to `fragment` when the hierarchy uses it without
/// defining it.
///
/// A design that never uses the default domain is returned untouched, so no
/// clock or reset is requested on its behalf.
pub fn fold_default_domain(
    mut fragment: Fragment,
    session: &mut Session<'_>,
    ports: &mut Vec<Signal>,
) -> Result<Fragment, Error> {
    if fragment.used_domains().contains(DEFAULT_DOMAIN) == false
        || fragment.defines_domain(DEFAULT_DOMAIN) == true
    {
        return Ok(fragment);
    }
    if let Some(m) = create_missing_domain(session, ports, DEFAULT_DOMAIN)? {
        fragment.add_submodule("cd_sync", Submodule::Fragment(m));
    }
    Ok(fragment)
}
