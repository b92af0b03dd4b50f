use crate::common_io::{read_lines_of_words_delim, write_lines};
use crate::traits::IoOps;
use ndarray::prelude::*;
use rayon::prelude::*;
use std::fmt::{Debug, Display};
use std::str::FromStr;

impl<T> IoOps for Array2<T>
where
    T: FromStr + Send + Sync + Display,
    <T as FromStr>::Err: Debug + Send,
{
    type Scalar = T;
    type Mat = Self;

    fn read_file_delim(
        file: &str,
        delim: &str,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat> {
        let hdr_line = match skip {
            Some(skip) => skip as i64,
            None => -1,
        };

        let lines_of_words = read_lines_of_words_delim(file, delim, hdr_line)?.lines;

        if lines_of_words.is_empty() {
            anyhow::bail!("no data in {}", file);
        }

        let nrows = lines_of_words.len();
        let ncols = lines_of_words[0].len();

        if let Some(i) = lines_of_words.iter().position(|w| w.len() != ncols) {
            anyhow::bail!(
                "{}: line {} has {} columns, expected {}",
                file,
                i + 1,
                lines_of_words[i].len(),
                ncols
            );
        }

        let data = lines_of_words
            .par_iter()
            .flat_map_iter(|words| words.iter().map(|v| v.parse::<T>()))
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| anyhow::anyhow!("{}: failed to parse: {:?}", file, e))?;

        Ok(Array2::from_shape_vec((nrows, ncols), data)?)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|x| format!("{}", *x))
                    .collect::<Vec<String>>()
                    .join(delim)
                    .into_boxed_str()
            })
            .collect();
        write_lines(&lines, file)?;
        Ok(())
    }
}
