use crate::common_io::*;
use std::io::Write;

/// Row, column, value with 0-based indices
pub type Triplet = (usize, usize, f64);

/// Contents of a MatrixMarket coordinate file
pub struct MtxTriplets {
    pub nrow: usize,
    pub ncol: usize,
    pub triplets: Vec<Triplet>,
}

/// Write the triplets into a MatrixMarket file with 1-based indices
/// * `triplets` - the triplets to write
/// * `nrow` - number of rows
/// * `ncol` - number of columns
/// * `mtx_file` - the output file (e.g., "matrix.mtx.gz")
pub fn write_mtx_triplets(
    triplets: &[Triplet],
    nrow: usize,
    ncol: usize,
    mtx_file: &str,
) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(mtx_file)?;

    writeln!(buf, "%%MatrixMarket matrix coordinate real general")?;
    writeln!(buf, "{}\t{}\t{}", nrow, ncol, triplets.len())?;

    for (row, col, val) in triplets {
        writeln!(buf, "{}\t{}\t{}", row + 1, col + 1, val)?;
    }

    buf.flush()?;
    Ok(())
}

/// Read a MatrixMarket coordinate file. The first non-comment line
/// is the `nrow ncol nnz` header; entries must lie within it.
/// * `mtx_file` - Path to the matrix market file
pub fn read_mtx_triplets(mtx_file: &str) -> anyhow::Result<MtxTriplets> {
    let ReadLinesOut { lines, header } = read_lines_of_words(mtx_file, 0)?;

    if header.len() != 3 {
        anyhow::bail!("failed to parse the mtx header of {}", mtx_file);
    }

    let nrow = header[0].parse::<usize>()?;
    let ncol = header[1].parse::<usize>()?;
    let nnz = header[2].parse::<usize>()?;

    let mut triplets = Vec::with_capacity(nnz);

    for (i, words) in lines.iter().enumerate() {
        if words.len() != 3 {
            anyhow::bail!("line {} of {}: expected `row col value`", i + 1, mtx_file);
        }

        let row = words[0].parse::<usize>()?;
        let col = words[1].parse::<usize>()?;
        let val = words[2].parse::<f64>()?;

        if row < 1 || row > nrow || col < 1 || col > ncol {
            anyhow::bail!(
                "line {} of {}: ({}, {}) outside of {} x {}",
                i + 1,
                mtx_file,
                row,
                col,
                nrow,
                ncol
            );
        }

        // convert 1-based to 0-based
        triplets.push((row - 1, col - 1, val));
    }

    if triplets.len() != nnz {
        log::warn!(
            "{}: header says {} non-zero elements, found {}",
            mtx_file,
            nnz,
            triplets.len()
        );
    }

    Ok(MtxTriplets {
        nrow,
        ncol,
        triplets,
    })
}
