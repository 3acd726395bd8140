use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::car::Paragraph;
use crate::error::Result;

/// Default number of records per corpus file.
pub const DOCS_PER_FILE: usize = 50_000;

/// Writes paragraphs as tag-delimited `trectext` records, rolling over to a
/// new numbered file every `cap` records.
///
/// Files are named `{stem}_{index}.trectext`, indexed from 0.
pub struct CorpusWriter {
    dir: PathBuf,
    stem: String,
    cap: usize,
    file_index: usize,
    written: usize,
    out: BufWriter<File>,
}

impl CorpusWriter {
    pub fn create(dir: impl AsRef<Path>, stem: &str, cap: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let out = open_part(&dir, stem, 0)?;
        Ok(CorpusWriter {
            dir,
            stem: stem.to_string(),
            cap,
            file_index: 0,
            written: 0,
            out,
        })
    }

    /// Append one paragraph record, rolling the output file first if the
    /// current one is full.
    pub fn write(&mut self, paragraph: &Paragraph) -> Result<()> {
        if self.written >= self.cap {
            self.roll()?;
        }
        write!(
            self.out,
            "<DOC>\n<DOCNO>{}</DOCNO>\n<TEXT>\n{}\n</TEXT>\n</DOC>\n\n",
            paragraph.para_id,
            paragraph.text()
        )?;
        self.written += 1;
        Ok(())
    }

    fn roll(&mut self) -> Result<()> {
        self.out.flush()?;
        info!(file_index = self.file_index, records = self.written, "corpus file filled");
        self.file_index += 1;
        self.written = 0;
        self.out = open_part(&self.dir, &self.stem, self.file_index)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        info!(file_index = self.file_index, records = self.written, "corpus conversion done");
        Ok(())
    }
}

fn open_part(dir: &Path, stem: &str, index: usize) -> Result<BufWriter<File>> {
    let path = dir.join(format!("{stem}_{index}.trectext"));
    Ok(BufWriter::new(File::create(path)?))
}

/// Stream a whole paragraph sequence into `writer`; returns the record count.
pub fn write_corpus(
    paragraphs: impl Iterator<Item = Result<Paragraph>>,
    writer: &mut CorpusWriter,
) -> Result<usize> {
    let mut count = 0usize;
    for paragraph in paragraphs {
        writer.write(&paragraph?)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::ParaBody;

    fn paragraph(id: &str, text: &str) -> Paragraph {
        Paragraph {
            para_id: id.to_string(),
            bodies: vec![ParaBody::Text {
                text: text.to_string(),
            }],
        }
    }

    #[test]
    fn record_format_is_tag_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CorpusWriter::create(dir.path(), "corpus", 10).unwrap();
        writer.write(&paragraph("p1", "some text")).unwrap();
        writer.finish().unwrap();

        let text = std::fs::read_to_string(dir.path().join("corpus_0.trectext")).unwrap();
        assert_eq!(
            text,
            "<DOC>\n<DOCNO>p1</DOCNO>\n<TEXT>\nsome text\n</TEXT>\n</DOC>\n\n"
        );
    }

    #[test]
    fn rolls_over_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CorpusWriter::create(dir.path(), "corpus", 2).unwrap();
        let paragraphs = (0..5).map(|i| Ok(paragraph(&format!("p{i}"), "t")));
        let count = write_corpus(paragraphs, &mut writer).unwrap();
        writer.finish().unwrap();
        assert_eq!(count, 5);

        let records_in = |index: usize| {
            let path = dir.path().join(format!("corpus_{index}.trectext"));
            std::fs::read_to_string(path)
                .unwrap()
                .matches("<DOC>")
                .count()
        };
        assert_eq!(records_in(0), 2);
        assert_eq!(records_in(1), 2);
        assert_eq!(records_in(2), 1);
        assert!(!dir.path().join("corpus_3.trectext").exists());
    }

    #[test]
    fn exact_multiple_of_cap_leaves_no_empty_trailing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CorpusWriter::create(dir.path(), "corpus", 2).unwrap();
        let paragraphs = (0..4).map(|i| Ok(paragraph(&format!("p{i}"), "t")));
        write_corpus(paragraphs, &mut writer).unwrap();
        writer.finish().unwrap();

        assert!(dir.path().join("corpus_1.trectext").exists());
        assert!(!dir.path().join("corpus_2.trectext").exists());
    }
}
