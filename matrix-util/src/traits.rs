/// Read and write matrices from and to files
pub trait IoOps {
    type Scalar;
    type Mat;

    fn read_file_delim(
        file: &str,
        delim: &str,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat>;

    fn from_tsv(tsv_file: &str, skip: Option<usize>) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(tsv_file, "\t", skip)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }
}

/// Matrices whose rows are probability distributions
pub trait StochasticOps {
    type Mat;
    type Scalar;

    /// Sample a `nrow x ncol` matrix with each row drawn from the flat
    /// Dirichlet distribution (normalized `Exp(1)` variates)
    fn sample_stochastic_rows<R: rand::Rng>(
        nrow: usize,
        ncol: usize,
        rng: &mut R,
    ) -> Self::Mat;

    /// Clamp every element below at `floor` and divide each row by
    /// its total. A row summing to zero (or to a non-finite value)
    /// before clamping is replaced by the uniform distribution.
    ///
    /// Returns the indices of the rows that had to be replaced.
    fn normalize_rows_inplace(&mut self, floor: Self::Scalar) -> Vec<usize>;

    /// Every row is non-negative and sums to one within `tol`
    fn is_row_stochastic(&self, tol: Self::Scalar) -> bool;
}
