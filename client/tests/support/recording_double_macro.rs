//! Declarative macro for single-method recording doubles.
//!
//! The generated double records a summary of every call and answers from a
//! queue of one-shot replies, falling back to a standing reply once the queue
//! is empty.

macro_rules! recording_double {
    (
        $(#[$reply_meta:meta])*
        $reply_vis:vis enum $reply:ident {
            $ok_variant:ident($ok_type:ty),
            $err_variant:ident($err_type:ty) $(,)?
        }

        $(#[$struct_meta:meta])*
        $struct_vis:vis struct $name:ident {
            records: $call_type:ty,
            implements: $trait_name:path,
            method: $method:ident ( &self $(, $arg:ident : $arg_ty:ty )* )
                -> Result<$method_ok:ty, $method_err:ty>,
            record: $record:expr $(,)?
        }
    ) => {
        $(#[$reply_meta])*
        #[derive(Clone)]
        $reply_vis enum $reply {
            $ok_variant($ok_type),
            $err_variant($err_type),
        }

        $(#[$struct_meta])*
        #[derive(Clone)]
        $struct_vis struct $name {
            calls: std::sync::Arc<std::sync::Mutex<Vec<$call_type>>>,
            replies: std::sync::Arc<
                std::sync::Mutex<(std::collections::VecDeque<$reply>, $reply)>,
            >,
        }

        impl $name {
            /// Double answering every call with `standing`.
            $struct_vis fn new(standing: $reply) -> Self {
                Self {
                    calls: std::sync::Arc::default(),
                    replies: std::sync::Arc::new(std::sync::Mutex::new((
                        std::collections::VecDeque::new(),
                        standing,
                    ))),
                }
            }

            /// Every recorded call, oldest first.
            $struct_vis fn calls(&self) -> Vec<$call_type> {
                self.calls
                    .lock()
                    .expect(concat!(stringify!($name), " calls lock"))
                    .clone()
            }

            /// Replace the standing reply and discard queued replies.
            $struct_vis fn set_response(&self, standing: $reply) {
                let mut replies = self
                    .replies
                    .lock()
                    .expect(concat!(stringify!($name), " replies lock"));
                replies.0.clear();
                replies.1 = standing;
            }

            /// Answer the next unanswered call with `reply`.
            $struct_vis fn queue(&self, reply: $reply) {
                self.replies
                    .lock()
                    .expect(concat!(stringify!($name), " replies lock"))
                    .0
                    .push_back(reply);
            }

            fn next_reply(&self) -> $reply {
                let mut replies = self
                    .replies
                    .lock()
                    .expect(concat!(stringify!($name), " replies lock"));
                let standing = replies.1.clone();
                replies.0.pop_front().unwrap_or(standing)
            }
        }

        #[async_trait::async_trait]
        impl $trait_name for $name {
            async fn $method(&self $(, $arg: $arg_ty )*) -> Result<$method_ok, $method_err> {
                self.calls
                    .lock()
                    .expect(concat!(stringify!($name), " calls lock"))
                    .push($record);
                match self.next_reply() {
                    $reply::$ok_variant(value) => Ok(value),
                    $reply::$err_variant(error) => Err(error),
                }
            }
        }
    };
}

pub(crate) use recording_double;
