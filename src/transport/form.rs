use std::path::{Path, PathBuf};

/// Arquivo anexado a uma requisição multipart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub path: PathBuf,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

impl FileAttachment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filename: None,
            mime_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Define o MIME type a partir da extensão, quando conhecida
    pub fn with_inferred_mime(mut self) -> Self {
        if self.mime_type.is_none() {
            self.mime_type = mime_from_extension(&self.path).map(str::to_string);
        }
        self
    }

    /// Nome enviado no multipart: o explícito ou o basename do caminho
    pub fn effective_filename(&self) -> String {
        self.filename
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| basename(&self.path))
    }
}

/// Basename de um caminho (vazio se não houver)
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "psd" => "image/vnd.adobe.photoshop",
        "pdf" => "application/pdf",
        "swf" => "application/x-shockwave-flash",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// Valor de um campo de formulário
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileAttachment),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileAttachment> {
        match self {
            Self::File(file) => Some(file),
            Self::Text(_) => None,
        }
    }
}

/// Campos de formulário em ordem de inserção.
///
/// Inserir um nome já existente substitui o valor na mesma posição.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, FormValue::Text(value.to_string()));
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FileAttachment) -> Self {
        self.insert(name, FormValue::File(file));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FormValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FormValue::as_text)
    }

    pub fn has_file(&self) -> bool {
        self.fields.iter().any(|(_, v)| matches!(v, FormValue::File(_)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Apenas os campos de texto, no formato aceito por `reqwest::RequestBuilder::form`
    pub fn text_pairs(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(n, v)| v.as_text().map(|t| (n.as_str(), t)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
