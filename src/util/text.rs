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

//! Small text transformations shared by the option resolver and the renderer.

/// Removes the whitespace prefix common to every non-blank line of `text`.
///
/// Lines consisting only of whitespace do not take part in computing the
/// margin and are emptied.
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|l| l.trim().is_empty() == false)
        .map(|l| indentation(l))
        .fold(None, |acc: Option<&str>, ind| match acc {
            None => Some(ind),
            Some(prev) => Some(common_prefix(prev, ind)),
        })
        .unwrap_or("");

    text.lines()
        .map(|l| match l.trim().is_empty() {
            true => "",
            false => &l[margin.len()..],
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Dedents `text` and trims surrounding whitespace.
pub fn dedent_trim(text: &str) -> String {
    dedent(text).trim().to_string()
}

/// Replaces every run of whitespace with a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() == true {
            if in_space == false {
                result.push(' ');
            }
            in_space = true;
        } else {
            result.push(c);
            in_space = false;
        }
    }
    result
}

/// Finds the 1-based line number of the first line of `text` containing `needle`.
pub fn find_line(text: &str, needle: &str) -> Option<usize> {
    text.lines()
        .position(|l| l.contains(needle))
        .map(|i| i + 1)
}

fn indentation(line: &str) -> &str {
    let rest = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - rest.len()]
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
