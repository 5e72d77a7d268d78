use gettextrs::gettext;

use crate::scanner::PipelineError;

pub trait UserFacingError {
    fn to_user_facing(&self) -> String;
}

impl UserFacingError for PipelineError {
    fn to_user_facing(&self) -> String {
        match self {
            PipelineError::NoCamera
            | PipelineError::InputRejected
            | PipelineError::OutputRejected => gettext("Fail Scanning"),
        }
    }
}
