use std::thread;
use std::time::Instant;
use std::sync::mpsc;
use std::sync::{ Arc, Mutex };

use log::{ debug, error, info, warn };

use crate::color::Color;
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;

pub enum Message {
    Column(usize),
    Terminate,
}

/// A finished column: its index and its colors from row 0 upward.
type ColumnResult = (usize, Vec<Color>);

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, world: Arc<World>, camera: Arc<Camera>,
        receiver: Arc<Mutex<mpsc::Receiver<Message>>>,
        results: mpsc::Sender<ColumnResult>) -> Worker {

        let thread = thread::spawn(move || loop {
            // Obtain the message being executed. A closed or poisoned queue
            // means the pool is gone.
            let message = match receiver.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => break,
            };

            match message {
                Ok(Message::Column(x)) => {
                    // Render a column and hand it back to the driver.
                    let column = camera.render_column(&world, x);
                    if results.send((x, column)).is_err() {
                        break;
                    }
                },

                Ok(Message::Terminate) | Err(_) => {
                    // Exit the worker thread loop, terminating the thread.
                    debug!("Worker {} terminating", id);
                    break;
                }
            }
        });

        Worker { id, thread: Some(thread) }
    }
}

/// A fixed set of worker threads pulling columns off a shared queue.
///
/// Dropping the pool tells every worker to stop once the queue is drained and
/// waits for all of them to exit.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

impl ThreadPool {
    pub fn new(size: usize, world: Arc<World>, camera: Arc<Camera>,
        results: mpsc::Sender<ColumnResult>) -> ThreadPool {
        // There should be at least one thread to run workers.
        let size = size.max(1);

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            workers.push(Worker::new(
                id,
                Arc::clone(&world),
                Arc::clone(&camera),
                Arc::clone(&receiver),
                results.clone(),
            ));
        }

        ThreadPool { workers, sender }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn execute(&self, message: Message) {
        if self.sender.send(message).is_err() {
            error!("All render workers have exited; job dropped");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for _ in &self.workers {
            self.execute(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("Worker {} panicked", worker.id);
                }
            }
        }
    }
}

/// Renders the world across `threads` worker threads.
///
/// Every column is rendered by exactly one worker; finished columns come back
/// over a channel and are written here, so the canvas is never shared. The
/// result is identical to `Camera::render`.
pub fn parallel_render(world: &Arc<World>, camera: &Arc<Camera>,
    threads: usize) -> Canvas {
    let threads = if threads == 0 {
        warn!("Thread count of 0 requested; using 1");
        1
    } else {
        threads
    };

    let (width, height) = (camera.width, camera.height);
    let mut canvas = Canvas::new(width, height);

    let start = Instant::now();
    let (results, finished) = mpsc::channel();

    {
        let pool = ThreadPool::new(
            threads, Arc::clone(world), Arc::clone(camera), results
        );
        info!("Rendering {}x{} using {} threads...", width, height,
            pool.size());

        for x in 0..width {
            pool.execute(Message::Column(x));
        }
    }

    // Every sender is gone once the pool has joined its workers.
    let mut count = 0;
    for (x, column) in finished.iter() {
        canvas.write_column(x, &column);
        count += 1;
    }

    debug!("Collected {} of {} columns", count, width);
    info!("...done in {:.2?}.", start.elapsed());

    canvas
}

#[cfg(test)]
fn test_scene() -> (World, Camera) {
    use glam::DVec3;
    use crate::shape::Shape;
    use crate::light::{ Light, Material };
    use crate::transform::{ translation, up_vector };

    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere().with_material(Material {
        diffuse: Color::rgb(0.8, 0.3, 0.3),
        specular: Color::gray(0.4),
        shininess: 30.0,
        ..Default::default()
    }));
    w.shapes.push(Shape::sphere(DVec3::ZERO, 0.5)
        .with_transform(translation(1.2, 0.4, 0.5)));
    w.shapes.push(Shape::triangle(
        DVec3::new(-3.0, -1.0, -3.0),
        DVec3::new(-3.0, -1.0, 3.0),
        DVec3::new(3.0, -1.0, 0.0),
    ).with_material(Material { specular: Color::gray(0.5), ..Default::default() }));
    w.lights.push(Light::point(DVec3::new(2.0, 4.0, 4.0), Color::white()));
    w.lights.push(Light::directional(DVec3::new(-1.0, 1.0, 1.0), Color::gray(0.3)));

    let eye = DVec3::new(0.0, 1.0, 6.0);
    let up = up_vector(DVec3::Y, -eye);
    let c = Camera::new(24, 16, eye, DVec3::ZERO, up, 40.0f64.to_radians());

    (w, c)
}

#[test]
fn parallel_matches_sequential() {
    let (w, c) = test_scene();
    let expected = c.render(&w);

    let world = Arc::new(w);
    let camera = Arc::new(c);

    for &threads in &[1, 3, 8] {
        assert_eq!(parallel_render(&world, &camera, threads), expected);
    }
}

#[test]
fn zero_threads_still_renders() {
    let (w, c) = test_scene();
    let expected = c.render(&w);

    let canvas = parallel_render(&Arc::new(w), &Arc::new(c), 0);
    assert_eq!(canvas, expected);
}
