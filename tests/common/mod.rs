#![allow(dead_code)]

use compliance_check::{
    config::Config,
    controller::UploadController,
    error::TransportError,
    media::SelectedFile,
    transport::{RawResponse, Submission, Transport},
};
use std::cell::RefCell;
use std::rc::Rc;

pub type SentLog = Rc<RefCell<Vec<Vec<(&'static str, String)>>>>;

/// Replies with a canned result and records the (field, file name) parts of every request.
pub struct ScriptedTransport {
    reply: Result<RawResponse, TransportError>,
    sent: SentLog,
}

impl ScriptedTransport {
    pub fn new(reply: Result<RawResponse, TransportError>) -> (Self, SentLog) {
        let sent = SentLog::default();
        (
            Self {
                reply,
                sent: Rc::clone(&sent),
            },
            sent,
        )
    }

    pub fn ok(body: &str) -> (Self, SentLog) {
        Self::new(Ok(RawResponse {
            status: 200,
            body: body.to_string(),
        }))
    }
}

impl Transport for ScriptedTransport {
    fn endpoint(&self) -> String {
        "http://scripted.test/api/check-compliance".into()
    }

    fn send(&self, submission: &Submission) -> Result<RawResponse, TransportError> {
        self.sent.borrow_mut().push(
            submission
                .parts
                .iter()
                .map(|p| (p.field, p.file.name.clone()))
                .collect(),
        );
        self.reply.clone()
    }
}

pub fn image(name: &str) -> SelectedFile {
    SelectedFile::new(format!("/tmp/{name}"), "image/png", 16)
}

pub fn pdf(name: &str) -> SelectedFile {
    SelectedFile::new(format!("/tmp/{name}"), "application/pdf", 64)
}

pub fn text(name: &str) -> SelectedFile {
    SelectedFile::new(format!("/tmp/{name}"), "text/plain", 8)
}

pub fn controller(reply_body: &str) -> (UploadController<ScriptedTransport>, SentLog) {
    let (t, sent) = ScriptedTransport::ok(reply_body);
    let ctl = UploadController::new(&Config::default(), t).expect("controller");
    (ctl, sent)
}

/// A controller with two images and a document, ready to submit.
pub fn ready(transport: ScriptedTransport) -> UploadController<ScriptedTransport> {
    let mut ctl = UploadController::new(&Config::default(), transport).expect("controller");
    ctl.add_images(vec![image("front.png"), image("back.png")]);
    assert!(ctl.set_document(pdf("manual.pdf")));
    ctl
}
