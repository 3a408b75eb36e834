//! Build a small tangle and print its Graphviz rendering to stdout.
//!
//! Pipe the output through `dot -Tsvg` to look at the DAG.

use std::io::{self, Write};
use tangle_core::{Tangle, TangleError};

fn main() -> Result<(), TangleError> {
    let tangle = Tangle::new(42)?;
    let [left, right] = tangle.genesis();

    let a = tangle.receive_block(b"a".to_vec(), &[left])?;
    let b = tangle.receive_block(b"b".to_vec(), &[left, right])?;
    let merge = tangle.receive_block(b"merge".to_vec(), &[a, b])?;
    for i in 0..4u8 {
        tangle.receive_block(vec![i], &[merge])?;
    }

    let mut rendered = Vec::new();
    tangle.draw(&mut rendered)?;
    io::stdout().write_all(&rendered)?;
    Ok(())
}
