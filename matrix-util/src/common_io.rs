use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::tempdir;

/// Split a line by `delim`; a single space means any run of white spaces
fn split_words(line: &str, delim: &str) -> Vec<Box<str>> {
    if delim == " " {
        line.split_whitespace().map(Box::from).collect()
    } else {
        line.split(delim).map(Box::from).collect()
    }
}

/// Words of the data lines and the (optional) header line
pub struct ReadLinesOut {
    pub lines: Vec<Vec<Box<str>>>,
    pub header: Vec<Box<str>>,
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('%')
}

///
/// Read every non-comment line of the input file and split it into words
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter between words
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: &str,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut> {
    let buf = open_buf_reader(input_file)?;

    let mut raw: Vec<Box<str>> = vec![];
    for line in buf.lines() {
        let line = line?;
        if is_comment_line(&line) || line.trim().is_empty() {
            continue;
        }
        raw.push(line.into_boxed_str());
    }

    let (header, data) = if hdr_line < 0 {
        (vec![], &raw[..])
    } else {
        let n_skip = hdr_line as usize;
        if raw.len() < n_skip + 1 {
            anyhow::bail!("not enough lines in {}", input_file);
        }
        (split_words(&raw[n_skip], delim), &raw[(n_skip + 1)..])
    };

    // parsing is the slow part; `collect` keeps the line order
    let lines = data
        .par_iter()
        .map(|s| split_words(s, delim))
        .collect::<Vec<_>>();

    Ok(ReadLinesOut { lines, header })
}

///
/// Same as `read_lines_of_words_delim`, splitting by white spaces
///
pub fn read_lines_of_words(input_file: &str, hdr_line: i64) -> anyhow::Result<ReadLinesOut> {
    read_lines_of_words_delim(input_file, " ", hdr_line)
}

///
/// Write every line into the output file
///
/// * `lines` - anything we can display
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(anyhow::anyhow!("failed to write {}: {}", output_file, e));
        }
    }
    buf.flush()?;
    Ok(())
}

///
/// Buffered reader, decompressing `.gz` files on the fly
///
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;

    match Path::new(input_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Buffered writer, compressing `.gz` files on the fly
///
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    mkdir(output_file)?;
    let file = File::create(output_file)?;

    match Path::new(output_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Create the parent directory of a file if needed
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    if let Some(dir) = Path::new(file).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

///
/// Suggest a file name in a fresh temporary directory
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_dir = tempdir()?.path().to_path_buf();
    std::fs::create_dir_all(&temp_dir)?;
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(temp_dir)?
        .path()
        .to_owned();

    Ok(temp_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_strs(words: &[Box<str>]) -> Vec<&str> {
        words.iter().map(|w| &**w).collect()
    }

    #[test]
    fn space_splits_runs_of_white_space() {
        let words = split_words("1\t 2   3", " ");
        assert_eq!(as_strs(&words), vec!["1", "2", "3"]);

        let words = split_words("a\t\tb", "\t");
        assert_eq!(as_strs(&words), vec!["a", "", "b"]);
    }
}
