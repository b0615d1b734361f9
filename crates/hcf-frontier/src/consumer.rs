use hcf_core::QueuedLink;

/// Receives the links of every completed fetch.
///
/// Invoked once per fetch; whatever it yields is forwarded by the host.
/// Any `FnMut(Vec<QueuedLink>) -> impl IntoIterator` is a consumer.
pub trait LinkConsumer {
    type Output;
    type Outputs: IntoIterator<Item = Self::Output>;

    fn new_links(&mut self, links: Vec<QueuedLink>) -> Self::Outputs;
}

impl<F, I> LinkConsumer for F
where
    F: FnMut(Vec<QueuedLink>) -> I,
    I: IntoIterator,
{
    type Output = I::Item;
    type Outputs = I;

    fn new_links(&mut self, links: Vec<QueuedLink>) -> I {
        self(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive<C: LinkConsumer>(consumer: &mut C, links: Vec<QueuedLink>) -> Vec<C::Output> {
        consumer.new_links(links).into_iter().collect()
    }

    #[test]
    fn test_closure_consumer_is_lazy_over_links() {
        let mut calls = 0;
        let mut consumer = |links: Vec<QueuedLink>| {
            calls += 1;
            links.into_iter().map(|l| l.fingerprint.len())
        };

        let links = vec![
            QueuedLink::from(("abc".to_string(), None)),
            QueuedLink::from(("de".to_string(), Some(serde_json::json!(1)))),
        ];
        assert_eq!(drive(&mut consumer, links), vec![3, 2]);
        assert_eq!(drive(&mut consumer, Vec::new()), Vec::<usize>::new());
        drop(consumer);
        assert_eq!(calls, 2);
    }
}
