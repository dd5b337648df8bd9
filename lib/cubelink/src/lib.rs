#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod model {
    pub use cubelink_model::*;
}

pub mod engine {
    pub use cubelink_engine::*;
}

pub mod remote {
    pub use cubelink_remote::*;
}

pub use cubelink_model::CubeError;
