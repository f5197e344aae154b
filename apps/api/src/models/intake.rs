use bytes::Bytes;
use serde::Serialize;

/// Extensions the file picker offers. Advisory only: nothing is rejected for a mismatch.
pub const ACCEPTED_RESUME_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];

/// An uploaded résumé. Contents are opaque; nothing here parses them.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// True when the name ends with one of the picker's extensions (case-insensitive).
    pub fn has_accepted_extension(&self) -> bool {
        let name = self.name.to_lowercase();
        ACCEPTED_RESUME_EXTENSIONS
            .iter()
            .any(|ext| name.ends_with(ext))
    }
}

/// User-supplied inputs required before an analysis can run.
#[derive(Debug, Clone, Default)]
pub struct IntakeState {
    pub job_description: String,
    pub job_url: String,
    pub resume: Option<ResumeFile>,
}

impl IntakeState {
    pub fn has_job_input(&self) -> bool {
        !self.job_description.is_empty() || !self.job_url.is_empty()
    }

    /// Complete iff some job input is present AND a résumé is attached.
    pub fn is_complete(&self) -> bool {
        self.has_job_input() && self.resume.is_some()
    }

    pub fn view(&self) -> IntakeView {
        IntakeView {
            job_description: self.job_description.clone(),
            job_url: self.job_url.clone(),
            resume: self.resume.as_ref().map(|r| ResumeSummary {
                name: r.name.clone(),
                content_type: r.content_type.clone(),
                size_bytes: r.size_bytes(),
            }),
            complete: self.is_complete(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeSummary {
    pub name: String,
    pub content_type: Option<String>,
    pub size_bytes: usize,
}

/// Read-only projection of the intake for the presentation layer. Never carries file bytes.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeView {
    pub job_description: String,
    pub job_url: String,
    pub resume: Option<ResumeSummary>,
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(name: &str) -> ResumeFile {
        ResumeFile::new(name, Some("application/pdf".to_string()), Bytes::from_static(b"%PDF"))
    }

    #[test]
    fn test_empty_intake_is_incomplete() {
        let intake = IntakeState::default();
        assert!(!intake.has_job_input());
        assert!(!intake.is_complete());
    }

    #[test]
    fn test_job_text_without_resume_is_incomplete() {
        let intake = IntakeState {
            job_description: "Senior Engineer".to_string(),
            ..Default::default()
        };
        assert!(intake.has_job_input());
        assert!(!intake.is_complete());
    }

    #[test]
    fn test_url_alone_counts_as_job_input() {
        let intake = IntakeState {
            job_url: "not even a url".to_string(),
            resume: Some(resume("cv.pdf")),
            ..Default::default()
        };
        assert!(intake.is_complete());
    }

    #[test]
    fn test_resume_without_job_input_is_incomplete() {
        let intake = IntakeState {
            resume: Some(resume("cv.pdf")),
            ..Default::default()
        };
        assert!(!intake.is_complete());
    }

    #[test]
    fn test_accepted_extensions_are_case_insensitive() {
        assert!(resume("Resume.PDF").has_accepted_extension());
        assert!(resume("cv.docx").has_accepted_extension());
        assert!(resume("cv.doc").has_accepted_extension());
        assert!(!resume("cv.txt").has_accepted_extension());
        assert!(!resume("pdf").has_accepted_extension());
    }

    #[test]
    fn test_view_omits_bytes_and_reports_size() {
        let intake = IntakeState {
            job_description: "Rust role".to_string(),
            job_url: String::new(),
            resume: Some(resume("resume.pdf")),
        };
        let view = intake.view();
        assert!(view.complete);
        let summary = view.resume.unwrap();
        assert_eq!(summary.name, "resume.pdf");
        assert_eq!(summary.size_bytes, 4);
    }
}
