use bootkit::prelude::*;

pub struct Greeter {
    greeting: String,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.greeting, name)
    }
}

#[derive(Default)]
#[module]
pub struct GreetingModule;

#[async_trait]
impl Module for GreetingModule {
    async fn configure(
        &mut self,
        ctx: &mut ConfigurationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let greeting = ctx.configuration().get_or("GREETING", "Hello");
        ctx.services_mut().register(Greeter { greeting });
        Ok(())
    }

    async fn initialize(
        &mut self,
        ctx: &mut InitializationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let greeter = ctx.services().resolve::<Greeter>()?;
        tracing::info!("Greeter ready: {}", greeter.greet("world"));
        Ok(())
    }
}
