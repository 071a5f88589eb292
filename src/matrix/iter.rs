use eyre::Report;

use super::{DecodeAction, Matrix};

/// Lazy iterator over the rows of a matrix in file-storage order.
///
/// Rows that fail to decode are passed to the matrix's decode-error handler.
/// On [`DecodeAction::Skip`] the row is counted and iteration continues; on
/// [`DecodeAction::Abort`] iteration ends and the error is kept for
/// [`take_error`](Self::take_error).
pub struct MatrixIter<'a, M: Matrix> {
    matrix: &'a M,
    pos: usize,
    skipped: usize,
    error: Option<Report>,
    done: bool,
}

impl<'a, M: Matrix> MatrixIter<'a, M> {
    pub(crate) fn new(matrix: &'a M) -> Self {
        Self {
            matrix,
            pos: 0,
            skipped: 0,
            error: None,
            done: false,
        }
    }

    /// Number of rows skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The error that aborted iteration, if any.
    pub fn take_error(&mut self) -> Option<Report> {
        self.error.take()
    }
}

impl<M: Matrix> Iterator for MatrixIter<'_, M> {
    type Item = M::Row;

    fn next(&mut self) -> Option<M::Row> {
        if self.done {
            return None;
        }

        let ids = self.matrix.row_ids();
        while let Some(&row_id) = ids.get(self.pos) {
            self.pos += 1;
            match self.matrix.get_row(row_id) {
                Ok(Some(row)) => return Some(row),
                Ok(None) => continue,
                Err(err) => match (self.matrix.decode_error_handler())(row_id, &err) {
                    DecodeAction::Skip => self.skipped += 1,
                    DecodeAction::Abort => {
                        self.error = Some(err);
                        self.done = true;
                        return None;
                    }
                },
            }
        }

        self.done = true;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.matrix.row_ids().len() - self.pos))
        }
    }
}
