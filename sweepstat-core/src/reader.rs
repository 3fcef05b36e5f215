use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use log::{debug, warn};
use sweepstat_types::{CaptureError, CaptureResult, Frame, Header, HeaderFields, KEY_FRAMES};

use crate::format::{split_line, FrameDecoder, DEFAULT_HEADER_LINE_LIMIT};

/// Сколько строк блока резервировать заранее, не доверяя `Values`
const PREALLOC_LINES: usize = 4096;

/// Последовательный читатель файла захвата с возможностью перемотки.
///
/// Владеет потоком, заголовком и последним декодированным кадром. Поток
/// читается только вперёд; [`CaptureFile::rewind`] возвращает курсор к
/// первому кадру (сразу после строки `Frames`).
pub struct CaptureFile<R: Read + Seek> {
    reader: BufReader<R>,
    source: String,
    header: Option<Header>,
    body_start: u64,
    last_frame: Option<Frame>,
    position: usize,
    exhausted: bool,
    line_buf: String,
}

impl CaptureFile<File> {
    /// Открывает файл и сразу читает заголовок (лимит
    /// [`DEFAULT_HEADER_LINE_LIMIT`] строк).
    pub fn open<P: AsRef<Path>>(path: P) -> CaptureResult<Self> {
        Self::open_with_limit(path, DEFAULT_HEADER_LINE_LIMIT)
    }

    /// То же, что [`CaptureFile::open`], с явным лимитом строк заголовка.
    pub fn open_with_limit<P: AsRef<Path>>(
        path: P,
        header_line_limit: usize,
    ) -> CaptureResult<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(CaptureError::FileNotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                CaptureError::FileNotFound(path.to_path_buf())
            }
            _ => CaptureError::Io(e),
        })?;

        let mut capture = Self::new(file, path.display().to_string());
        capture.read_header(header_line_limit)?;

        Ok(capture)
    }
}

impl<R: Read + Seek> CaptureFile<R> {
    /// Оборачивает поток без чтения заголовка.
    pub fn new<S: Into<String>>(
        inner: R,
        source: S,
    ) -> Self {
        Self {
            reader: BufReader::new(inner),
            source: source.into(),
            header: None,
            body_start: 0,
            last_frame: None,
            position: 0,
            exhausted: false,
            line_buf: String::new(),
        }
    }

    /// Читает заголовок с начала потока, не более `line_limit` строк.
    ///
    /// Останавливается на строке с ключом `Frames` и запоминает позицию
    /// начала кадров. При ошибке заголовок остаётся непрочитанным.
    pub fn read_header(
        &mut self,
        line_limit: usize,
    ) -> CaptureResult<&Header> {
        self.header = None;
        self.last_frame = None;
        self.reader.seek(SeekFrom::Start(0))?;

        let mut fields = HeaderFields::new();

        for _ in 0..line_limit {
            if !self.next_line()? {
                break;
            }

            let (key, values) = split_line(&self.line_buf);
            let mut values: Vec<String> = values.into_iter().map(str::to_string).collect();

            while values.last().is_some_and(|v| v.is_empty()) {
                values.pop();
            }

            let is_marker = key == KEY_FRAMES;
            fields.insert(key.to_string(), values);

            if is_marker {
                self.body_start = self.reader.stream_position()?;
                self.position = 0;
                self.exhausted = false;

                let header = Header::from_fields(fields)?;
                debug!(
                    "{}: header read, {} frames × {} values, body at byte {}",
                    self.source, header.frames, header.values, self.body_start
                );

                return Ok(&*self.header.insert(header));
            }
        }

        Err(CaptureError::header_incomplete(format!(
            "'{KEY_FRAMES}' marker not found within {line_limit} lines of {}",
            self.source
        )))
    }

    /// Перематывает курсор на первый кадр.
    pub fn rewind(&mut self) -> CaptureResult<()> {
        if self.header.is_none() {
            return Err(CaptureError::NotInitialized);
        }

        self.reader.seek(SeekFrom::Start(self.body_start))?;
        self.last_frame = None;
        self.position = 0;
        self.exhausted = false;

        Ok(())
    }

    /// Читает следующий кадр: ровно `Values + 2` строк.
    ///
    /// При ошибке курсор возвращается к началу блока, а текущего кадра нет.
    pub fn read_frame(&mut self) -> CaptureResult<&Frame> {
        let expected = self
            .header
            .as_ref()
            .ok_or(CaptureError::NotInitialized)?
            .lines_per_frame();

        self.last_frame = None;

        let block_start = self.reader.stream_position()?;

        match self.read_block(expected) {
            Ok(frame) => {
                self.position += 1;
                Ok(&*self.last_frame.insert(frame))
            }
            Err(e) => {
                if let Err(seek_err) = self.reader.seek(SeekFrom::Start(block_start)) {
                    warn!("{}: failed to restore cursor: {seek_err}", self.source);
                }
                Err(e)
            }
        }
    }

    /// Перематывает файл и возвращает кадр с порядковым номером `n` (от 0).
    pub fn seek_frame(
        &mut self,
        n: usize,
    ) -> CaptureResult<&Frame> {
        let available = self.frame_count()?;

        if n >= available {
            return Err(CaptureError::FrameOutOfRange {
                requested: n,
                available,
            });
        }

        self.rewind()?;

        for _ in 0..n {
            self.read_frame()?;
        }

        self.read_frame()
    }

    /// Количество кадров по заголовку (`Frames`).
    pub fn frame_count(&self) -> CaptureResult<usize> {
        Ok(self.header()?.frames)
    }

    /// Единицы осей `(x, y)`.
    pub fn axis_units(&self) -> CaptureResult<(&str, &str)> {
        let h = self.header()?;
        Ok((h.x_unit.as_str(), h.y_unit.as_str()))
    }

    /// Время развёртки (`SWT`) в секундах.
    pub fn sweep_time(&self) -> CaptureResult<f64> {
        Ok(self.header()?.sweep_time)
    }

    pub fn header(&self) -> CaptureResult<&Header> {
        self.header.as_ref().ok_or(CaptureError::NotInitialized)
    }

    pub fn last_frame(&self) -> CaptureResult<&Frame> {
        self.last_frame.as_ref().ok_or(CaptureError::NoFrameRead)
    }

    /// Идентификатор источника (путь к файлу).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Номер следующего кадра относительно начала данных.
    pub fn position(&self) -> usize {
        self.position
    }

    fn read_block(
        &mut self,
        expected: usize,
    ) -> CaptureResult<Frame> {
        let mut lines = Vec::with_capacity(expected.min(PREALLOC_LINES));

        while lines.len() < expected {
            if !self.next_line()? {
                return Err(CaptureError::UnexpectedEof {
                    expected,
                    read: lines.len(),
                });
            }
            lines.push(std::mem::take(&mut self.line_buf));
        }

        let header = self.header.as_ref().ok_or(CaptureError::NotInitialized)?;

        FrameDecoder::decode(header, lines.as_slice())
    }

    fn next_line(&mut self) -> CaptureResult<bool> {
        self.line_buf.clear();

        Ok(self.reader.read_line(&mut self.line_buf)? != 0)
    }
}

impl<R: Read + Seek> Iterator for CaptureFile<R> {
    type Item = CaptureResult<Frame>;

    /// Следующий кадр до конца файла по заголовку. После ошибки итерация
    /// останавливается до следующего [`CaptureFile::rewind`].
    fn next(&mut self) -> Option<Self::Item> {
        let available = self.header.as_ref()?.frames;

        if self.exhausted || self.position >= available {
            return None;
        }

        match self.read_frame() {
            Ok(frame) => Some(Ok(frame.clone())),
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
